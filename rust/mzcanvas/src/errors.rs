use thiserror::Error;

use crate::canvas::CanvasId;
use crate::render::ArtifactId;

/// Hard failures of the engine.
///
/// Missing data is never an error: optional layers are skipped, searches
/// return sentinel indices and matches return `None`. What remains are
/// lifecycle bugs, where an operation runs before the state it needs exists.
#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Canvas {0:?} has no scales, render it before interacting with it")]
    UninitializedScales(CanvasId),

    #[error("Canvas {0:?} has no container, render it before drawing layers")]
    UninitializedContainer(CanvasId),

    #[error("Artifact {0:?} is not attached to the scene")]
    MissingArtifact(ArtifactId),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unparseable color '{0}'")]
    Color(String),
}
