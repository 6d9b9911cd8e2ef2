pub mod color;
pub mod path;
pub mod scale;
pub mod scene;

pub use color::{
    ColorCycle,
    Rgb,
};
pub use scale::LinearScale;
pub use scene::{
    ArtifactId,
    Element,
    Scene,
    Tag,
};
