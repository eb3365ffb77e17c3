use crate::{
    foundation::{
        core::{Affine, BezPath, Color, ImageData, Rect},
        error::{SceneryError, SceneryResult},
    },
    render::surface::{Canvas, FillStyle, PaintState, Surface},
    scene::style::Shadow,
};

/// One draw call captured by [`RecordingSurface`], with the state in force when it was made.
///
/// `alpha` is the global alpha at call time; colors are recorded as passed.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Fill {
        path: BezPath,
        color: Color,
        shadow: Option<Shadow>,
        transform: Affine,
        alpha: f64,
    },
    Stroke {
        path: BezPath,
        color: Color,
        width: f64,
        transform: Affine,
        alpha: f64,
    },
    Clip {
        path: BezPath,
        transform: Affine,
    },
    Image {
        width: u32,
        height: u32,
        dst: Rect,
        transform: Affine,
        alpha: f64,
    },
    Blit {
        /// Commands recorded on the source surface at blit time.
        source_commands: usize,
        source_size: (u32, u32),
        dst: Rect,
        transform: Affine,
        alpha: f64,
    },
}

impl DrawCommand {
    /// Device-space bounds of the drawn geometry.
    pub fn device_bounds(&self) -> Option<Rect> {
        use kurbo::Shape;
        match self {
            Self::Clear(_) => None,
            Self::Fill {
                path, transform, ..
            }
            | Self::Stroke {
                path, transform, ..
            }
            | Self::Clip { path, transform } => Some((*transform * path.clone()).bounding_box()),
            Self::Image { dst, transform, .. } | Self::Blit { dst, transform, .. } => {
                Some(transform.transform_rect_bbox(*dst))
            }
        }
    }

    pub fn alpha(&self) -> f64 {
        match self {
            Self::Fill { alpha, .. }
            | Self::Stroke { alpha, .. }
            | Self::Image { alpha, .. }
            | Self::Blit { alpha, .. } => *alpha,
            Self::Clear(_) | Self::Clip { .. } => 1.0,
        }
    }

    pub fn is_draw(&self) -> bool {
        !matches!(self, Self::Clear(_) | Self::Clip { .. })
    }
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    state: PaintState,
    commands: Vec<DrawCommand>,
    flushes: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Fill commands in call order.
    pub fn fills(&self) -> impl Iterator<Item = (&Color, f64)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Fill { color, alpha, .. } => Some((color, *alpha)),
            _ => None,
        })
    }

    /// Number of commands that put pixels on the surface.
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn save_depth(&self) -> usize {
        self.state.depth()
    }
}

impl Canvas for RecordingSurface {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn concat(&mut self, m: Affine) {
        self.state.concat(m);
    }

    fn transform(&self) -> Affine {
        self.state.matrix()
    }

    fn global_alpha(&self) -> f64 {
        self.state.alpha()
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.set_alpha(alpha);
    }

    fn clip(&mut self, path: &BezPath) {
        self.state.push_clip();
        self.commands.push(DrawCommand::Clip {
            path: path.clone(),
            transform: self.state.matrix(),
        });
    }

    fn fill(&mut self, path: &BezPath, style: &FillStyle) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color: style.color,
            shadow: style.shadow,
            transform: self.state.matrix(),
            alpha: self.state.alpha(),
        });
    }

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            color,
            width,
            transform: self.state.matrix(),
            alpha: self.state.alpha(),
        });
    }

    fn draw_image(&mut self, image: &ImageData, dst: Rect) {
        self.commands.push(DrawCommand::Image {
            width: image.width,
            height: image.height,
            dst,
            transform: self.state.matrix(),
            alpha: self.state.alpha(),
        });
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn create_offscreen(&self, width: u32, height: u32) -> SceneryResult<Self> {
        if width == 0 || height == 0 {
            return Err(SceneryError::surface(format!(
                "empty offscreen surface {width}x{height}"
            )));
        }
        Ok(Self::new(width, height))
    }

    fn reset(&mut self, width: u32, height: u32) -> SceneryResult<()> {
        self.width = width;
        self.height = height;
        self.state = PaintState::new();
        self.commands.clear();
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn blit(&mut self, src: &Self, dst: Rect) {
        self.commands.push(DrawCommand::Blit {
            source_commands: src.commands.len(),
            source_size: (src.width, src.height),
            dst,
            transform: self.state.matrix(),
            alpha: self.state.alpha(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
