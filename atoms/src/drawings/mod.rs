pub mod model;
pub mod service;
pub mod http;

pub use model::{Drawing, Fill, SaveDrawingPayload, Stroke};
pub use http::*;
