use image::{Rgba, RgbaImage};

use super::engine::{CanvasEngine, STAGE_HEIGHT, STAGE_WIDTH};
use super::model::SceneNode;

/// Rasterize the fully composited scene into a static snapshot, for the
/// download action. `base` is the decoded coloring-page image, already
/// sized to the stage; without one the snapshot starts from a white page.
///
/// The stage handle is this explicit engine reference - nothing global.
pub fn render_snapshot(engine: &CanvasEngine, base: Option<&RgbaImage>) -> RgbaImage {
    let width = STAGE_WIDTH as u32;
    let height = STAGE_HEIGHT as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for node in engine.scene() {
        match node {
            SceneNode::Image { .. } => {
                if let Some(base) = base {
                    blit(&mut canvas, base);
                }
            }
            // the path reference is opaque (often a URL), so the snapshot
            // fills the mask's bounding region instead
            SceneNode::Path {
                fill,
                opacity,
                bbox,
                ..
            } => {
                let [x1, y1, x2, y2] = bbox;
                fill_rect(&mut canvas, x1, y1, x2 - x1, y2 - y1, &fill, opacity);
            }
            SceneNode::Rect {
                x,
                y,
                width,
                height,
                fill,
                opacity,
            } => fill_rect(&mut canvas, x, y, width, height, &fill, opacity),
            SceneNode::Circle {
                x,
                y,
                radius,
                fill,
                opacity,
            } => fill_circle(&mut canvas, x, y, radius, &fill, opacity),
            SceneNode::Line {
                points,
                stroke,
                stroke_width,
                ..
            } => stroke_polyline(&mut canvas, &points, &stroke, stroke_width),
        }
    }

    canvas
}

fn blit(canvas: &mut RgbaImage, base: &RgbaImage) {
    let width = canvas.width().min(base.width());
    let height = canvas.height().min(base.height());
    for y in 0..height {
        for x in 0..width {
            canvas.put_pixel(x, y, *base.get_pixel(x, y));
        }
    }
}

/// Parse a `#rrggbb` color. The palette only ever hands out that form;
/// anything else degrades to black.
fn parse_color(color: &str) -> Rgba<u8> {
    let hex = color.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Rgba([r, g, b, 255]);
        }
    }
    Rgba([0, 0, 0, 255])
}

/// Source-over blend of one pixel at the given opacity.
fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, opacity: f64) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let src = color.0[channel] as f64;
        let old = dst.0[channel] as f64;
        dst.0[channel] = (src * opacity + old * (1.0 - opacity)).round() as u8;
    }
    dst.0[3] = 255;
}

fn fill_rect(canvas: &mut RgbaImage, x: f64, y: f64, width: f64, height: f64, fill: &str, opacity: f64) {
    let color = parse_color(fill);
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = (x + width).ceil() as i64;
    let y1 = (y + height).ceil() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(canvas, px, py, color, opacity);
        }
    }
}

fn fill_circle(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, fill: &str, opacity: f64) {
    let color = parse_color(fill);
    let r2 = radius * radius;
    let x0 = (cx - radius).floor() as i64;
    let x1 = (cx + radius).ceil() as i64;
    let y0 = (cy - radius).floor() as i64;
    let y1 = (cy + radius).ceil() as i64;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend_pixel(canvas, px, py, color, opacity);
            }
        }
    }
}

/// Stamp round caps along every segment - round joins fall out for free.
fn stroke_polyline(canvas: &mut RgbaImage, points: &[f64], stroke: &str, stroke_width: f64) {
    let color = parse_color(stroke);
    let radius = (stroke_width / 2.0).max(0.5);

    let coords: Vec<(f64, f64)> = points.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    if coords.is_empty() {
        return;
    }
    if coords.len() == 1 {
        stamp(canvas, coords[0].0, coords[0].1, radius, color);
        return;
    }

    for pair in coords.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = (length.ceil() as usize).max(1);
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            stamp(
                canvas,
                x0 + (x1 - x0) * t,
                y0 + (y1 - y0) * t,
                radius,
                color,
            );
        }
    }
}

fn stamp(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let r2 = radius * radius;
    let x0 = (cx - radius).floor() as i64;
    let x1 = (cx + radius).ceil() as i64;
    let y0 = (cy - radius).floor() as i64;
    let y1 = (cy + radius).ceil() as i64;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend_pixel(canvas, px, py, color, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::engine::Tool;

    #[test]
    fn snapshot_has_stage_dimensions_and_a_white_background() {
        let engine = CanvasEngine::new("u", None);
        let snapshot = render_snapshot(&engine, None);
        assert_eq!(snapshot.dimensions(), (600, 600));
        assert_eq!(snapshot.get_pixel(300, 300).0, [255, 255, 255, 255]);
    }

    #[test]
    fn circle_fill_blends_at_half_opacity_over_white() {
        let mut engine = CanvasEngine::new("u", None);
        engine.set_tool(Tool::Fill);
        engine.set_color("#ff0000");
        engine.pointer_down(300.0, 300.0);

        let snapshot = render_snapshot(&engine, None);
        // red over white at 0.5: (255, 128, 128)
        let px = snapshot.get_pixel(300, 300).0;
        assert_eq!(px[0], 255);
        assert!(px[1] >= 127 && px[1] <= 128);
        assert!(px[2] >= 127 && px[2] <= 128);

        // well outside the 50px fallback radius nothing changed
        assert_eq!(snapshot.get_pixel(500, 500).0, [255, 255, 255, 255]);
    }

    #[test]
    fn strokes_render_opaque_on_top_of_fills() {
        let mut engine = CanvasEngine::new("u", None);
        engine.set_tool(Tool::Fill);
        engine.set_color("#00ff00");
        engine.pointer_down(300.0, 300.0);

        engine.set_tool(Tool::Draw);
        engine.set_color("#000000");
        engine.pointer_down(280.0, 300.0);
        engine.pointer_move(320.0, 300.0);
        engine.pointer_up();

        let snapshot = render_snapshot(&engine, None);
        assert_eq!(snapshot.get_pixel(300, 300).0, [0, 0, 0, 255]);
    }

    #[test]
    fn base_image_shows_through_where_nothing_was_drawn() {
        let engine = CanvasEngine::new("u", None);
        let base = RgbaImage::from_pixel(600, 600, Rgba([10, 20, 30, 255]));
        let snapshot = render_snapshot(&engine, Some(&base));
        assert_eq!(snapshot.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn unparseable_colors_degrade_to_black() {
        assert_eq!(parse_color("#zzzzzz").0, [0, 0, 0, 255]);
        assert_eq!(parse_color("red").0, [0, 0, 0, 255]);
        assert_eq!(parse_color("#ff9900").0, [255, 153, 0, 255]);
    }
}
