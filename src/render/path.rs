use kurbo::{RoundedRect, RoundedRectRadii, Shape};

use crate::foundation::core::{BezPath, Frame};

const PATH_TOLERANCE: f64 = 0.1;

/// Corner radii clamped to `[0, min(width, height) / 2]`.
///
/// Order is top-left, top-right, bottom-right, bottom-left.
pub fn clamp_radii(frame: Frame, radii: [f64; 4]) -> [f64; 4] {
    let limit = (frame.width.min(frame.height) / 2.0).max(0.0);
    radii.map(|r| if r.is_finite() { r.clamp(0.0, limit) } else { 0.0 })
}

/// Closed outline of `frame` with per-corner radii.
pub fn rounded_rect_path(frame: Frame, radii: [f64; 4]) -> BezPath {
    let [tl, tr, br, bl] = clamp_radii(frame, radii);
    if tl == 0.0 && tr == 0.0 && br == 0.0 && bl == 0.0 {
        return frame.rect().to_path(PATH_TOLERANCE);
    }
    RoundedRect::from_rect(frame.rect(), RoundedRectRadii::new(tl, tr, br, bl))
        .to_path(PATH_TOLERANCE)
}

#[cfg(test)]
#[path = "../../tests/unit/render/path.rs"]
mod tests;
