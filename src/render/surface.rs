use crate::{
    foundation::{
        core::{Affine, BezPath, Color, ImageData, Point, Rect},
        error::SceneryResult,
    },
    scene::style::Shadow,
    transform::Transform,
};

/// Paint for a path fill. The shadow, when present, is drawn under this fill only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub shadow: Option<Shadow>,
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            shadow: None,
        }
    }

    pub fn with_shadow(mut self, shadow: Option<Shadow>) -> Self {
        self.shadow = shadow;
        self
    }
}

/// Drawing operations available to the paint engine and to content drawers.
///
/// Follows 2D canvas semantics: transform calls post-multiply, `save`/`restore` snapshot the
/// transform, the global alpha and the clip, and every draw is multiplied by the global alpha.
pub trait Canvas {
    fn save(&mut self);

    /// Unbalanced restores are ignored.
    fn restore(&mut self);

    fn concat(&mut self, m: Affine);

    fn transform(&self) -> Affine;

    fn global_alpha(&self) -> f64;

    fn set_global_alpha(&mut self, alpha: f64);

    /// Intersect the clip with `path` (in current user space) until the matching `restore`.
    fn clip(&mut self, path: &BezPath);

    fn fill(&mut self, path: &BezPath, style: &FillStyle);

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64);

    /// Draw `image` scaled into `dst` (user space).
    fn draw_image(&mut self, image: &ImageData, dst: Rect);

    fn translate(&mut self, x: f64, y: f64) {
        self.concat(Affine::translate((x, y)));
    }

    fn rotate(&mut self, radians: f64) {
        self.concat(Affine::rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Affine::scale_non_uniform(sx, sy));
    }
}

/// A raster target the engine owns: the root surface and offscreen cache surfaces.
pub trait Surface: Canvas + Sized {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// A fresh surface of the same backend.
    fn create_offscreen(&self, width: u32, height: u32) -> SceneryResult<Self>;

    /// Resize and drop all content and state, keeping the backing allocation where possible.
    fn reset(&mut self, width: u32, height: u32) -> SceneryResult<()>;

    /// Fill the whole surface with `color`, ignoring transform, clip and alpha.
    fn clear(&mut self, color: Color);

    /// Make pending draws visible in the surface's pixels.
    fn flush(&mut self);

    /// Copy `src` (already flushed) into `dst` in current user space.
    fn blit(&mut self, src: &Self, dst: Rect);
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Saved {
    alpha: f64,
    clips: usize,
}

/// Save/restore bookkeeping shared by surface implementations.
#[derive(Clone, Debug)]
pub struct PaintState {
    transform: Transform,
    alpha: f64,
    clips: usize,
    saved: Vec<Saved>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintState {
    pub fn new() -> Self {
        Self {
            transform: Transform::new(),
            alpha: 1.0,
            clips: 0,
            saved: Vec::new(),
        }
    }

    pub fn save(&mut self) {
        self.transform.save();
        self.saved.push(Saved {
            alpha: self.alpha,
            clips: self.clips,
        });
    }

    /// Returns how many clip layers were opened since the matching `save`.
    pub fn restore(&mut self) -> usize {
        let Some(saved) = self.saved.pop() else {
            return 0;
        };
        self.transform.restore();
        self.alpha = saved.alpha;
        let opened = self.clips.saturating_sub(saved.clips);
        self.clips = saved.clips;
        opened
    }

    pub fn concat(&mut self, m: Affine) {
        self.transform.multiply(m);
    }

    pub fn matrix(&self) -> Affine {
        self.transform.matrix()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
    }

    pub fn push_clip(&mut self) {
        self.clips += 1;
    }

    pub fn clip_depth(&self) -> usize {
        self.clips
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn map_point(&self, p: Point) -> Point {
        self.transform.transform_point(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
