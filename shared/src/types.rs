// ========== IMAGE ==========
pub use colorbook_atoms::images::model::{
    CreateImagePayload, GeneratedImage, Mask, SegmentationData,
};

// ========== DRAWING ==========
pub use colorbook_atoms::drawings::model::{Drawing, Fill, SaveDrawingPayload, Stroke};

// ========== CANVAS ==========
pub use colorbook_atoms::canvas::{CanvasEngine, DrawingSnapshot, SceneNode, Tool};
