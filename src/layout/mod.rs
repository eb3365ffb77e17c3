//! Flex layout boundary.
//!
//! The engine does not compute flexbox itself. [`LayoutSolver`] mirrors the primitive calls of an
//! external constraint solver (create a node, set a property, attach children, compute, read back a
//! rectangle, free); [`adapter::update_layout`] maps node styles onto those calls through a fixed
//! dispatch table and writes the results back as root-space frames.

use crate::{
    foundation::error::SceneryResult,
    scene::style::{Align, FlexDirection, FlexWrap, JustifyContent, PositionType},
};

/// Style-to-solver mapping and the layout pass.
pub mod adapter;
/// `taffy`-backed solver.
pub mod taffy_solver;

/// Opaque solver-side node handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SolverNode(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
    All,
}

/// Closed set of properties the adapter may set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutProperty {
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    /// Shorthand: positive -> grow with zero basis, negative -> shrink.
    Flex,
    FlexGrow,
    FlexShrink,
    AspectRatio,
    JustifyContent,
    AlignItems,
    AlignSelf,
    AlignContent,
    FlexDirection,
    FlexWrap,
    PositionType,
    Position(Edge),
    Padding(Edge),
    Margin(Edge),
    Border(Edge),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutValue {
    Points(f64),
    /// 0..=100.
    Percent(f64),
    Auto,
    Justify(JustifyContent),
    Align(Align),
    Wrap(FlexWrap),
    FlexDirection(FlexDirection),
    PositionType(PositionType),
}

/// Text direction hint passed to `calculate_layout`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Inherit,
    Ltr,
    Rtl,
}

/// Solver output for one node, relative to its parent's padding box origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComputedLayout {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Primitive operations of an external flex-layout solver.
pub trait LayoutSolver {
    fn create_node(&mut self) -> SceneryResult<SolverNode>;

    /// Fails with `StyleValue` when the solver cannot express `value` for `property`.
    fn set_property(
        &mut self,
        node: SolverNode,
        property: LayoutProperty,
        value: LayoutValue,
    ) -> SceneryResult<()>;

    fn insert_child(
        &mut self,
        parent: SolverNode,
        child: SolverNode,
        index: usize,
    ) -> SceneryResult<()>;

    fn calculate_layout(
        &mut self,
        root: SolverNode,
        width: f64,
        height: f64,
        direction: Direction,
    ) -> SceneryResult<()>;

    fn computed_layout(&self, node: SolverNode) -> SceneryResult<ComputedLayout>;

    fn free(&mut self, node: SolverNode);
}
