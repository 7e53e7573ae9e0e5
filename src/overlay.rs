use image::{imageops, imageops::FilterType, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::config::{parse_hex, OverlayConfig};
use crate::types::{ArmTriple, Landmark};

/// Colors and sizes used when drawing an arm over a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub dot_radius: i32,
    pub dot_color: Rgb<u8>,
    pub line_color: Rgb<u8>,
    pub line_thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            dot_radius: 10,
            dot_color: Rgb([255, 0, 0]),
            line_color: Rgb([255, 255, 255]),
            line_thickness: 2,
        }
    }
}

impl From<&OverlayConfig> for OverlayStyle {
    fn from(config: &OverlayConfig) -> Self {
        let (dr, dg, db) = parse_hex(&config.dot_color_hex);
        let (lr, lg, lb) = parse_hex(&config.line_color_hex);
        Self {
            dot_radius: config.dot_radius,
            dot_color: Rgb([dr, dg, db]),
            line_color: Rgb([lr, lg, lb]),
            line_thickness: config.line_thickness.max(1),
        }
    }
}

/// Filled circle at a landmark's pixel position. Points off the frame are
/// clipped by the primitive.
pub fn draw_landmark(frame: &mut RgbImage, landmark: &Landmark, radius: i32, color: Rgb<u8>) {
    let (x, y) = landmark.to_pixel(frame.width(), frame.height());
    draw_filled_circle_mut(frame, (x as i32, y as i32), radius, color);
}

fn draw_thick_segment(
    frame: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    thickness: u32,
    color: Rgb<u8>,
) {
    // Stack parallel one-pixel lines, offset across the dominant axis
    let steep = (end.1 - start.1).abs() > (end.0 - start.0).abs();
    let half = (thickness as f32 - 1.0) / 2.0;
    for i in 0..thickness {
        let offset = i as f32 - half;
        let (dx, dy) = if steep { (offset, 0.0) } else { (0.0, offset) };
        draw_line_segment_mut(
            frame,
            (start.0 + dx, start.1 + dy),
            (end.0 + dx, end.1 + dy),
            color,
        );
    }
}

/// Draws shoulder, elbow and wrist dots joined by two segments.
pub fn draw_arm(frame: &mut RgbImage, arm: &ArmTriple, style: &OverlayStyle) {
    let (w, h) = frame.dimensions();
    let shoulder = arm.shoulder.to_pixel(w, h);
    let elbow = arm.elbow.to_pixel(w, h);
    let wrist = arm.wrist.to_pixel(w, h);

    for point in arm.points() {
        draw_landmark(frame, &point, style.dot_radius, style.dot_color);
    }

    draw_thick_segment(frame, shoulder, elbow, style.line_thickness, style.line_color);
    draw_thick_segment(frame, elbow, wrist, style.line_thickness, style.line_color);
}

/// Scales to `width` keeping the aspect ratio.
pub fn fit_to_width(frame: &RgbImage, width: u32) -> RgbImage {
    if frame.width() == width || frame.width() == 0 {
        return frame.clone();
    }
    let height = ((frame.height() as u64 * width as u64) / frame.width() as u64).max(1) as u32;
    imageops::resize(frame, width, height, FilterType::Triangle)
}
