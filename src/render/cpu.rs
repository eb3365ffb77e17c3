use std::sync::Arc;

use vello_cpu::kurbo::Stroke;

use crate::{
    foundation::{
        core::{Affine, BezPath, Color, ImageData, Point, Rect},
        error::{SceneryError, SceneryResult},
    },
    render::{
        blur::{blur_extent, blur_premul},
        surface::{Canvas, FillStyle, PaintState, Surface},
    },
    scene::style::Shadow,
};

/// Raster surface backed by a `vello_cpu` render context.
///
/// Draw calls accumulate in the context; [`Surface::flush`] rasterizes them into the pixmap.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    state: PaintState,
    /// Clip layers currently pushed on `ctx`.
    open_clips: usize,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("open_clips", &self.open_clips)
            .finish()
    }
}

fn dims(width: u32, height: u32) -> SceneryResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SceneryError::surface("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SceneryError::surface("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(SceneryError::surface(format!("empty surface {width}x{height}")));
    }
    Ok((w, h))
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> SceneryResult<Self> {
        let (w, h) = dims(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            state: PaintState::new(),
            open_clips: 0,
        })
    }

    /// Flush and copy out the pixels.
    pub fn snapshot(&mut self) -> ImageData {
        self.flush();
        ImageData {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: Arc::new(self.pixmap.data_as_u8_slice().to_vec()),
        }
    }

    fn sync(&mut self) {
        self.ctx.set_transform(affine_to_cpu(self.state.matrix()));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn alpha(&self) -> f32 {
        self.state.alpha() as f32
    }

    /// Run `draw` inside an opacity layer when the global alpha is below 1.
    fn with_alpha(&mut self, draw: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let alpha = self.alpha();
        if alpha <= 0.0 {
            return;
        }
        if alpha < 1.0 {
            self.ctx.push_opacity_layer(alpha);
        }
        draw(&mut self.ctx);
        if alpha < 1.0 {
            self.ctx.pop_layer();
        }
    }

    /// Fill the pixmap's own rectangle under `to_device`.
    fn paint_pixmap(&mut self, pixmap: vello_cpu::Pixmap, to_device: Affine) {
        let (iw, ih) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
        self.ctx.set_transform(affine_to_cpu(to_device));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        self.with_alpha(|ctx| ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih)));
        self.sync();
    }

    fn paint_image(&mut self, pixmap: vello_cpu::Pixmap, dst: Rect) {
        let (iw, ih) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
        if dst.width() == 0.0 || dst.height() == 0.0 {
            return;
        }
        let local = Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / iw, dst.height() / ih);
        self.paint_pixmap(pixmap, self.state.matrix() * local);
    }

    fn paint_shadow(&mut self, path: &BezPath, shadow: &Shadow) {
        if shadow.color.is_transparent() {
            return;
        }
        if shadow.blur <= 0.0 {
            self.ctx.set_transform(affine_to_cpu(
                Affine::translate(shadow.offset) * self.state.matrix(),
            ));
            self.ctx.set_paint(color_to_cpu(shadow.color));
            let cpu_path = bezpath_to_cpu(path);
            self.with_alpha(|ctx| ctx.fill_path(&cpu_path));
            self.sync();
            return;
        }
        if let Err(err) = self.paint_blurred_shadow(path, shadow) {
            tracing::warn!(%err, "blurred shadow failed; drawing it sharp");
            let sharp = Shadow {
                blur: 0.0,
                ..*shadow
            };
            self.paint_shadow(path, &sharp);
        }
    }

    /// Rasterize the shadow shape offscreen in device space, blur it and composite it back.
    ///
    /// The offset is applied in device space, like a canvas shadow.
    fn paint_blurred_shadow(&mut self, path: &BezPath, shadow: &Shadow) -> SceneryResult<()> {
        use kurbo::Shape;

        let device = Affine::translate(shadow.offset) * self.state.matrix();
        let pad = blur_extent(shadow.blur);
        let bounds = (device * path.clone())
            .bounding_box()
            .inflate(pad, pad)
            .intersect(Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ))
            .expand();
        if bounds.width() < 1.0 || bounds.height() < 1.0 {
            return Ok(());
        }

        let (w, h) = dims(bounds.width() as u32, bounds.height() as u32)?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(affine_to_cpu(
            Affine::translate((-bounds.x0, -bounds.y0)) * device,
        ));
        ctx.set_paint(color_to_cpu(shadow.color));
        ctx.fill_path(&bezpath_to_cpu(path));
        let mut layer = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut layer);

        let blurred = blur_premul(
            layer.data_as_u8_slice(),
            u32::from(w),
            u32::from(h),
            shadow.blur,
        )?;
        let pixmap = premul_bytes_to_pixmap(&blurred, u32::from(w), u32::from(h))?;
        self.paint_pixmap(pixmap, Affine::translate((bounds.x0, bounds.y0)));
        Ok(())
    }

    /// Drop open clip layers from the context along with the save stack they belong to.
    fn close_clips(&mut self) {
        if self.open_clips == 0 {
            return;
        }
        tracing::debug!(clips = self.open_clips, "closing open clip layers");
        for _ in 0..self.open_clips {
            self.ctx.pop_layer();
        }
        self.open_clips = 0;
        self.state = PaintState::new();
    }
}

impl Canvas for CpuSurface {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        let opened = self.state.restore();
        for _ in 0..opened.min(self.open_clips) {
            self.ctx.pop_layer();
            self.open_clips -= 1;
        }
        self.sync();
    }

    fn concat(&mut self, m: Affine) {
        self.state.concat(m);
        self.sync();
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
        self.sync();
        self.ctx.push_clip_layer(&bezpath_to_cpu(path));
        self.state.push_clip();
        self.open_clips += 1;
    }

    fn fill(&mut self, path: &BezPath, style: &FillStyle) {
        if style.color.is_transparent() {
            return;
        }
        if let Some(shadow) = &style.shadow {
            let shadow = Shadow {
                color: shadow
                    .color
                    .with_alpha_factor(f32::from(style.color.a) / 255.0),
                ..*shadow
            };
            self.paint_shadow(path, &shadow);
        }
        self.sync();
        self.ctx.set_paint(color_to_cpu(style.color));
        let cpu_path = bezpath_to_cpu(path);
        self.with_alpha(|ctx| ctx.fill_path(&cpu_path));
    }

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64) {
        if color.is_transparent() || width.is_nan() || width <= 0.0 {
            return;
        }
        self.sync();
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.set_stroke(Stroke::new(width));
        let cpu_path = bezpath_to_cpu(path);
        self.with_alpha(|ctx| ctx.stroke_path(&cpu_path));
    }

    fn draw_image(&mut self, image: &ImageData, dst: Rect) {
        match premul_bytes_to_pixmap(&image.data, image.width, image.height) {
            Ok(pixmap) => self.paint_image(pixmap, dst),
            Err(err) => tracing::warn!(%err, "skipping image draw"),
        }
    }
}

impl Surface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn create_offscreen(&self, width: u32, height: u32) -> SceneryResult<Self> {
        Self::new(width, height)
    }

    fn reset(&mut self, width: u32, height: u32) -> SceneryResult<()> {
        let (w, h) = dims(width, height)?;
        if (w, h) == (self.width, self.height) {
            self.ctx.reset();
            clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
        } else {
            self.ctx = vello_cpu::RenderContext::new(w, h);
            self.pixmap = vello_cpu::Pixmap::new(w, h);
            self.width = w;
            self.height = h;
        }
        self.state = PaintState::new();
        self.open_clips = 0;
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.close_clips();
        // Everything drawn so far is covered, so the pending commands can go.
        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        if !color.is_transparent() {
            self.ctx.set_paint(color_to_cpu(color));
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }
        self.sync();
    }

    /// Rasterize everything drawn since the last clear. Open clips are closed first.
    fn flush(&mut self) {
        self.close_clips();
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.sync();
    }

    fn blit(&mut self, src: &Self, dst: Rect) {
        let pixmap = premul_bytes_to_pixmap(
            src.pixmap.data_as_u8_slice(),
            u32::from(src.width),
            u32::from(src.height),
        );
        match pixmap {
            Ok(p) => self.paint_image(p, dst),
            Err(err) => tracing::warn!(%err, "skipping blit"),
        }
    }
}

fn color_to_cpu(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SceneryResult<vello_cpu::Pixmap> {
    let (w, h) = dims(width, height)?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SceneryError::surface("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
