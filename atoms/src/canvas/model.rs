use serde::Serialize;

use crate::drawings::model::{Fill, Stroke};

/// Fills composite at half opacity with source-over blending so overlapping
/// regions visibly mix.
pub const FILL_OPACITY: f64 = 0.5;

/// One node of the composed scene, listed back to front. The set mirrors
/// what a 2D canvas front end draws directly: the base image, fill shapes,
/// then smoothed strokes.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum SceneNode {
    Image {
        url: String,
        width: f64,
        height: f64,
    },
    /// A mask-anchored fill with a renderable path reference. The reference
    /// is opaque (SVG data or a URL), so the source mask's bbox rides along
    /// for consumers that can't interpret it.
    Path {
        data: String,
        fill: String,
        opacity: f64,
        bbox: [f64; 4],
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        opacity: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        fill: String,
        opacity: f64,
    },
    Line {
        points: Vec<f64>,
        stroke: String,
        stroke_width: f64,
        tension: f64,
    },
}

/// What the autosaver persists - the drawing's content without the record
/// bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSnapshot {
    pub lines: Vec<Stroke>,
    pub fills: Vec<Fill>,
}
