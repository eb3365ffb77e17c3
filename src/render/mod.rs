//! Painting: surfaces, the offscreen cache and the recursive paint pass.

/// Gaussian blur for shadows.
pub mod blur;
/// Offscreen surface cache and cache ids.
pub mod cache;
/// `vello_cpu` raster surface.
pub mod cpu;
/// Recursive node painter and content drawers.
pub mod paint;
/// Rounded-rectangle outlines.
pub mod path;
/// Draw-call recording surface.
pub mod recording;
/// Canvas and surface traits.
pub mod surface;
