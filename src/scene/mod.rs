//! Node/frame data model: the styled tree the engine lays out, paints and hit-tests.

/// Node handles, kinds and per-node props.
pub mod node;
/// Typed style fragments and their resolved paint form.
pub mod style;
/// Arena tree with generation-checked handles.
pub mod tree;
