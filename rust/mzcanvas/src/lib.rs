#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::canvas::{
    BrushState,
    Canvas,
    CanvasId,
    CanvasKind,
    RedrawEvent,
    Selection,
    Timestamp,
};
pub use crate::config::CanvasConfig;
pub use crate::models::{
    Point,
    PointLike,
    SourceEntity,
    ViewData,
};
pub use crate::render::Scene;
pub use crate::state::{
    CanvasAction,
    CanvasState,
};

// Re-export traits
pub use crate::layers::{
    Layer,
    LayerLike,
};

// Declare modules
pub mod canvas;
pub mod config;
pub mod errors;
pub mod layers;
pub mod models;
pub mod render;
pub mod search;
pub mod state;

// Re-export errors
pub use crate::errors::CanvasError;
