use std::sync::Arc;

use crate::foundation::error::{SceneryError, SceneryResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Scale alpha by `factor` (clamped to `[0, 1]`).
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            a: (f32::from(self.a) * f).round() as u8,
            ..self
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`.
    pub fn parse(s: &str) -> SceneryResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        let bad = || SceneryError::style_value("color", format!("{s:?}"));
        let hex = s.strip_prefix('#').ok_or_else(bad)?;
        if !hex.is_ascii() {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(&hex[i..=i], 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(bad()),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgba([u8; 4]),
    Rgb([u8; 3]),
}

impl TryFrom<ColorRepr> for Color {
    type Error = SceneryError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(s) => Color::parse(&s),
            ColorRepr::Rgba([r, g, b, a]) => Ok(Color::rgba(r, g, b, a)),
            ColorRepr::Rgb([r, g, b]) => Ok(Color::rgb(r, g, b)),
        }
    }
}

/// Computed rectangle of a node in root space, excluding its own paint-time transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Hit rule: strictly past the left/top edge, up to and including the right/bottom edge.
    pub fn contains(&self, p: Point) -> bool {
        self.x < p.x && self.y < p.y && p.x <= self.x + self.width && p.y <= self.y + self.height
    }
}

/// Premultiplied RGBA8 pixels, tightly packed and row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Arc<Vec<u8>>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> SceneryResult<Self> {
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(SceneryError::surface("image byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(rgba8_premul),
        })
    }

    /// A `width x height` image filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = color.to_premul();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }

    /// Premultiplied pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
