//! Touch input: hit-testing, per-touch target routing, bubbling dispatch and scroll physics.

/// Drag-to-scroll with momentum and paging.
pub mod scroller;
/// Touch events, hit-testing and the touch router.
pub mod touch;
