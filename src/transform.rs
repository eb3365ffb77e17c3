//! 2x3 affine matrix with a save/restore stack.
//!
//! Operations post-multiply, so each call acts in the coordinate space established by the
//! previous ones (the same convention as a 2D canvas context).

use crate::foundation::core::{Affine, Point};

#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    matrix: Affine,
    stack: Vec<Affine>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            matrix: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// `[a, b, c, d, e, f]` in canvas `setTransform` order.
    pub fn coeffs(&self) -> [f64; 6] {
        self.matrix.as_coeffs()
    }

    pub fn set_matrix(&mut self, m: Affine) {
        self.matrix = m;
    }

    pub fn save(&mut self) {
        self.stack.push(self.matrix);
    }

    /// Pop the last saved matrix. Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(m) = self.stack.pop() {
            self.matrix = m;
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.matrix *= Affine::translate((x, y));
    }

    pub fn rotate(&mut self, radians: f64) {
        self.matrix *= Affine::rotate(radians);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.matrix *= Affine::scale_non_uniform(sx, sy);
    }

    pub fn multiply(&mut self, m: Affine) {
        self.matrix *= m;
    }

    pub fn transform_point(&self, p: Point) -> Point {
        self.matrix * p
    }
}

#[cfg(test)]
#[path = "../tests/unit/transform.rs"]
mod tests;
