//! Animated values, easing curves and the tick-driven timing scheduler.

/// Easing curves.
pub mod ease;
/// Tick source and clocks.
pub mod ticker;
/// Tick-driven interpolation toward a target.
pub mod timing;
/// Observable scalars and keyframe interpolation.
pub mod value;
