pub mod autosave;
pub mod engine;
pub mod export;
pub mod model;

pub use autosave::Autosaver;
pub use engine::{CanvasEngine, Tool, STAGE_HEIGHT, STAGE_WIDTH};
pub use model::{DrawingSnapshot, SceneNode};
