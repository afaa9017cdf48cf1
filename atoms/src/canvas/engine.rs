use crate::drawings::model::{Drawing, Fill, Stroke};
use crate::images::model::Mask;

use super::model::{DrawingSnapshot, SceneNode, FILL_OPACITY};

pub const STAGE_WIDTH: f64 = 600.0;
pub const STAGE_HEIGHT: f64 = 600.0;

/// Smoothing applied to freehand strokes at render time.
const LINE_TENSION: f64 = 0.5;

const DEFAULT_COLOR: &str = "#ff0000";
const DEFAULT_STROKE_WIDTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Draw,
    Fill,
}

/// Interactive coloring surface over a fixed 600x600 stage.
///
/// Pointer and touch input feed the same three entry points - a host
/// embedding the engine routes touch-start/touch-move to `pointer_down` /
/// `pointer_move` and must suppress the default scroll gesture while a touch
/// is on the stage.
///
/// Every mutation bumps `revision`, which is what hosts watch to feed the
/// autosaver.
#[derive(Debug)]
pub struct CanvasEngine {
    tool: Tool,
    color: String,
    stroke_width: f64,
    lines: Vec<Stroke>,
    fills: Vec<Fill>,
    drawing: bool,
    masks: Vec<Mask>,
    image_url: String,
    revision: u64,
}

impl CanvasEngine {
    /// Build an engine for one coloring page. `masks` is whatever the image
    /// record currently carries - segmentation may still be running, and a
    /// missing mask list is a normal interim state, not an error.
    pub fn new(image_url: impl Into<String>, masks: Option<Vec<Mask>>) -> Self {
        CanvasEngine {
            tool: Tool::Draw,
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            lines: Vec::new(),
            fills: Vec::new(),
            drawing: false,
            masks: masks.unwrap_or_default(),
            image_url: image_url.into(),
            revision: 0,
        }
    }

    /// Load a previously saved drawing. Legacy fills without a mask index
    /// already arrive converted by deserialization.
    pub fn hydrate(&mut self, drawing: &Drawing) {
        self.lines = drawing.lines.clone();
        self.fills = drawing.fills.clone();
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
    }

    pub fn lines(&self) -> &[Stroke] {
        &self.lines
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Bumped on every stroke/fill mutation; hosts watch this to schedule
    /// autosaves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        match self.tool {
            Tool::Draw => {
                self.drawing = true;
                self.lines.push(Stroke {
                    points: vec![x, y],
                    stroke: self.color.clone(),
                    stroke_width: self.stroke_width,
                });
                self.revision += 1;
            }
            Tool::Fill => self.perform_fill(x, y),
        }
    }

    /// Extend the stroke in progress. Only the last stroke ever grows -
    /// strokes closed by pointer-up are never touched again.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.drawing || self.tool != Tool::Draw {
            return;
        }

        if let Some(last) = self.lines.last_mut() {
            last.points.push(x);
            last.points.push(y);
            self.revision += 1;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    /// Drop all strokes and fills.
    pub fn clear(&mut self) {
        if self.lines.is_empty() && self.fills.is_empty() {
            return;
        }
        self.lines.clear();
        self.fills.clear();
        self.revision += 1;
    }

    pub fn snapshot(&self) -> DrawingSnapshot {
        DrawingSnapshot {
            lines: self.lines.clone(),
            fills: self.fills.clone(),
        }
    }

    fn perform_fill(&mut self, x: f64, y: f64) {
        if let Some(index) = self.mask_at_point(x, y) {
            self.fills.push(Fill {
                mask_index: index as i32,
                color: self.color.clone(),
                x: None,
                y: None,
                radius: None,
            });
        } else {
            let radius = Self::adaptive_radius(x, y);
            self.fills.push(Fill {
                mask_index: -1,
                color: self.color.clone(),
                x: Some(x),
                y: Some(y),
                radius: Some(radius),
            });
        }
        self.revision += 1;
    }

    /// First mask (in index order) whose bounding box contains the point.
    /// Containment is bbox-only even when a precise path exists - a known
    /// approximation kept on purpose.
    fn mask_at_point(&self, x: f64, y: f64) -> Option<usize> {
        let px = x.floor();
        let py = y.floor();

        self.masks.iter().position(|mask| {
            let [x1, y1, x2, y2] = mask.bbox;
            px >= x1 && px <= x2 && py >= y1 && py <= y2
        })
    }

    /// Circle-fill radius when no mask matched: half the distance to the
    /// nearest stage edge, clamped to [20, 50] so fills shrink near the
    /// border instead of overflowing it.
    pub fn adaptive_radius(x: f64, y: f64) -> f64 {
        let edge_distance = x.min(y).min(STAGE_WIDTH - x).min(STAGE_HEIGHT - y);
        (edge_distance / 2.0).clamp(20.0, 50.0)
    }

    /// Compose the scene back to front: base image, fills in order, then
    /// strokes in order.
    pub fn scene(&self) -> Vec<SceneNode> {
        let mut nodes = Vec::with_capacity(1 + self.fills.len() + self.lines.len());

        nodes.push(SceneNode::Image {
            url: self.image_url.clone(),
            width: STAGE_WIDTH,
            height: STAGE_HEIGHT,
        });

        for fill in &self.fills {
            nodes.push(fill_node(fill, &self.masks));
        }

        for line in &self.lines {
            nodes.push(SceneNode::Line {
                points: line.points.clone(),
                stroke: line.stroke.clone(),
                stroke_width: line.stroke_width,
                tension: LINE_TENSION,
            });
        }

        nodes
    }
}

/// Shape for one fill: a mask-anchored fill renders its mask's path when
/// there is one, falls back to the bounding box, and degrades to a circle
/// when the mask index no longer resolves. Point-anchored fills are always
/// circles.
fn fill_node(fill: &Fill, masks: &[Mask]) -> SceneNode {
    if fill.mask_index >= 0 {
        if let Some(mask) = masks.get(fill.mask_index as usize) {
            if let Some(path) = &mask.mask_path {
                return SceneNode::Path {
                    data: path.clone(),
                    fill: fill.color.clone(),
                    opacity: FILL_OPACITY,
                    bbox: mask.bbox,
                };
            }

            let [x1, y1, x2, y2] = mask.bbox;
            return SceneNode::Rect {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                fill: fill.color.clone(),
                opacity: FILL_OPACITY,
            };
        }
    }

    SceneNode::Circle {
        x: fill.x.unwrap_or(0.0),
        y: fill.y.unwrap_or(0.0),
        radius: fill.radius.unwrap_or(50.0),
        fill: fill.color.clone(),
        opacity: FILL_OPACITY,
    }
}
