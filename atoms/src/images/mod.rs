pub mod model;
pub mod service;
pub mod http;

pub use model::{CreateImagePayload, GeneratedImage, Mask, SegmentationData};
pub use http::*;
