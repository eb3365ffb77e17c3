use std::collections::HashSet;

use taffy::prelude::{AvailableSpace, NodeId, Size, TaffyTree};
use taffy::TraversePartialTree;
use taffy::style::{
    AlignContent, AlignItems, Dimension, FlexDirection as TaffyFlexDirection,
    FlexWrap as TaffyFlexWrap, JustifyContent as TaffyJustify, LengthPercentage,
    LengthPercentageAuto, Position, Style,
};

use crate::{
    foundation::error::{SceneryError, SceneryResult},
    layout::{ComputedLayout, Direction, Edge, LayoutProperty, LayoutSolver, LayoutValue, SolverNode},
    scene::style::{Align, FlexDirection, FlexWrap, JustifyContent, PositionType},
};

/// [`LayoutSolver`] on top of a `taffy` tree.
///
/// New nodes start from column-direction, non-shrinking flex defaults so unstyled trees stack
/// vertically like a mobile layout engine rather than in taffy's web-style row default.
pub struct TaffySolver {
    taffy: TaffyTree<()>,
    /// taffy indexes its slot maps directly in some calls, so stale handles are filtered here.
    live: HashSet<u64>,
}

impl Default for TaffySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaffySolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaffySolver")
            .field("nodes", &self.taffy.total_node_count())
            .finish()
    }
}

fn base_style() -> Style {
    Style {
        flex_direction: TaffyFlexDirection::Column,
        flex_shrink: 0.0,
        align_content: Some(AlignContent::FlexStart),
        ..Style::default()
    }
}

fn id(node: SolverNode) -> NodeId {
    NodeId::from(node.0)
}

fn bad(property: LayoutProperty, value: LayoutValue) -> SceneryError {
    SceneryError::style_value(format!("{property:?}"), format!("{value:?}"))
}

fn dimension(p: LayoutProperty, v: LayoutValue) -> SceneryResult<Dimension> {
    match v {
        LayoutValue::Points(n) => Ok(Dimension::length(n as f32)),
        LayoutValue::Percent(n) => Ok(Dimension::percent(n as f32 / 100.0)),
        LayoutValue::Auto => Ok(Dimension::auto()),
        _ => Err(bad(p, v)),
    }
}

fn length_percentage(p: LayoutProperty, v: LayoutValue) -> SceneryResult<LengthPercentage> {
    match v {
        LayoutValue::Points(n) => Ok(LengthPercentage::length(n as f32)),
        LayoutValue::Percent(n) => Ok(LengthPercentage::percent(n as f32 / 100.0)),
        _ => Err(bad(p, v)),
    }
}

fn length_percentage_auto(
    p: LayoutProperty,
    v: LayoutValue,
) -> SceneryResult<LengthPercentageAuto> {
    match v {
        LayoutValue::Points(n) => Ok(LengthPercentageAuto::length(n as f32)),
        LayoutValue::Percent(n) => Ok(LengthPercentageAuto::percent(n as f32 / 100.0)),
        LayoutValue::Auto => Ok(LengthPercentageAuto::auto()),
        _ => Err(bad(p, v)),
    }
}

fn number(p: LayoutProperty, v: LayoutValue) -> SceneryResult<f32> {
    match v {
        LayoutValue::Points(n) => Ok(n as f32),
        _ => Err(bad(p, v)),
    }
}

fn set_edge<T: Copy>(rect: &mut taffy::prelude::Rect<T>, edge: Edge, v: T) {
    match edge {
        Edge::Left => rect.left = v,
        Edge::Top => rect.top = v,
        Edge::Right => rect.right = v,
        Edge::Bottom => rect.bottom = v,
        Edge::All => {
            rect.left = v;
            rect.top = v;
            rect.right = v;
            rect.bottom = v;
        }
    }
}

fn align_items(p: LayoutProperty, v: LayoutValue, a: Align) -> SceneryResult<Option<AlignItems>> {
    Ok(match a {
        Align::Auto => None,
        Align::FlexStart => Some(AlignItems::FlexStart),
        Align::Center => Some(AlignItems::Center),
        Align::FlexEnd => Some(AlignItems::FlexEnd),
        Align::Stretch => Some(AlignItems::Stretch),
        Align::Baseline => Some(AlignItems::Baseline),
        Align::SpaceBetween | Align::SpaceAround => return Err(bad(p, v)),
    })
}

fn align_content(
    p: LayoutProperty,
    v: LayoutValue,
    a: Align,
) -> SceneryResult<Option<AlignContent>> {
    Ok(match a {
        Align::Auto => None,
        Align::FlexStart => Some(AlignContent::FlexStart),
        Align::Center => Some(AlignContent::Center),
        Align::FlexEnd => Some(AlignContent::FlexEnd),
        Align::Stretch => Some(AlignContent::Stretch),
        Align::SpaceBetween => Some(AlignContent::SpaceBetween),
        Align::SpaceAround => Some(AlignContent::SpaceAround),
        Align::Baseline => return Err(bad(p, v)),
    })
}

fn apply(style: &mut Style, p: LayoutProperty, v: LayoutValue) -> SceneryResult<()> {
    use LayoutProperty as P;
    match p {
        P::Width => style.size.width = dimension(p, v)?,
        P::Height => style.size.height = dimension(p, v)?,
        P::MinWidth => style.min_size.width = dimension(p, v)?,
        P::MaxWidth => style.max_size.width = dimension(p, v)?,
        P::MinHeight => style.min_size.height = dimension(p, v)?,
        P::MaxHeight => style.max_size.height = dimension(p, v)?,
        P::Flex => {
            let n = number(p, v)?;
            if n > 0.0 {
                style.flex_grow = n;
                style.flex_basis = Dimension::length(0.0);
            } else if n < 0.0 {
                style.flex_grow = 0.0;
                style.flex_shrink = -n;
                style.flex_basis = Dimension::auto();
            } else {
                style.flex_grow = 0.0;
                style.flex_shrink = 0.0;
            }
        }
        P::FlexGrow => style.flex_grow = number(p, v)?.max(0.0),
        P::FlexShrink => style.flex_shrink = number(p, v)?.max(0.0),
        P::AspectRatio => {
            let n = number(p, v)?;
            style.aspect_ratio = (n > 0.0).then_some(n);
        }
        P::JustifyContent => {
            let LayoutValue::Justify(j) = v else {
                return Err(bad(p, v));
            };
            style.justify_content = Some(match j {
                JustifyContent::FlexStart => TaffyJustify::FlexStart,
                JustifyContent::Center => TaffyJustify::Center,
                JustifyContent::FlexEnd => TaffyJustify::FlexEnd,
                JustifyContent::SpaceBetween => TaffyJustify::SpaceBetween,
                JustifyContent::SpaceAround => TaffyJustify::SpaceAround,
                JustifyContent::SpaceEvenly => TaffyJustify::SpaceEvenly,
            });
        }
        P::AlignItems | P::AlignSelf | P::AlignContent => {
            let LayoutValue::Align(a) = v else {
                return Err(bad(p, v));
            };
            match p {
                P::AlignItems => style.align_items = align_items(p, v, a)?,
                P::AlignSelf => style.align_self = align_items(p, v, a)?,
                _ => style.align_content = align_content(p, v, a)?,
            }
        }
        P::FlexDirection => {
            let LayoutValue::FlexDirection(d) = v else {
                return Err(bad(p, v));
            };
            style.flex_direction = match d {
                FlexDirection::Column => TaffyFlexDirection::Column,
                FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
                FlexDirection::Row => TaffyFlexDirection::Row,
                FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
            };
        }
        P::FlexWrap => {
            let LayoutValue::Wrap(w) = v else {
                return Err(bad(p, v));
            };
            style.flex_wrap = match w {
                FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
                FlexWrap::Wrap => TaffyFlexWrap::Wrap,
                FlexWrap::WrapReverse => TaffyFlexWrap::WrapReverse,
            };
        }
        P::PositionType => {
            let LayoutValue::PositionType(t) = v else {
                return Err(bad(p, v));
            };
            // taffy has no static positioning; relative is the closest fit.
            style.position = match t {
                PositionType::Static | PositionType::Relative => Position::Relative,
                PositionType::Absolute => Position::Absolute,
            };
        }
        P::Position(edge) => set_edge(&mut style.inset, edge, length_percentage_auto(p, v)?),
        P::Padding(edge) => set_edge(&mut style.padding, edge, length_percentage(p, v)?),
        P::Margin(edge) => set_edge(&mut style.margin, edge, length_percentage_auto(p, v)?),
        P::Border(edge) => set_edge(&mut style.border, edge, length_percentage(p, v)?),
    }
    Ok(())
}

impl TaffySolver {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            live: HashSet::new(),
        }
    }

    fn check(&self, node: SolverNode) -> SceneryResult<NodeId> {
        if self.live.contains(&node.0) {
            Ok(id(node))
        } else {
            Err(SceneryError::layout(format!("unknown solver node {}", node.0)))
        }
    }

    /// Live solver nodes.
    pub fn node_count(&self) -> usize {
        self.taffy.total_node_count()
    }
}

impl LayoutSolver for TaffySolver {
    fn create_node(&mut self) -> SceneryResult<SolverNode> {
        let nid = self.taffy.new_leaf(base_style())?;
        let raw = u64::from(nid);
        self.live.insert(raw);
        Ok(SolverNode(raw))
    }

    fn set_property(
        &mut self,
        node: SolverNode,
        property: LayoutProperty,
        value: LayoutValue,
    ) -> SceneryResult<()> {
        let nid = self.check(node)?;
        let mut style = self.taffy.style(nid)?.clone();
        apply(&mut style, property, value)?;
        self.taffy.set_style(nid, style)?;
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent: SolverNode,
        child: SolverNode,
        index: usize,
    ) -> SceneryResult<()> {
        let parent = self.check(parent)?;
        let child = self.check(child)?;
        let index = index.min(self.taffy.child_count(parent));
        self.taffy.insert_child_at_index(parent, index, child)?;
        Ok(())
    }

    fn calculate_layout(
        &mut self,
        root: SolverNode,
        width: f64,
        height: f64,
        direction: Direction,
    ) -> SceneryResult<()> {
        if direction == Direction::Rtl {
            tracing::debug!("taffy has no rtl support; laying out left-to-right");
        }
        let available = Size {
            width: AvailableSpace::Definite(width as f32),
            height: AvailableSpace::Definite(height as f32),
        };
        self.taffy.compute_layout(self.check(root)?, available)?;
        Ok(())
    }

    fn computed_layout(&self, node: SolverNode) -> SceneryResult<ComputedLayout> {
        let l = self.taffy.layout(self.check(node)?)?;
        Ok(ComputedLayout {
            left: f64::from(l.location.x),
            top: f64::from(l.location.y),
            width: f64::from(l.size.width),
            height: f64::from(l.size.height),
        })
    }

    fn free(&mut self, node: SolverNode) {
        if !self.live.remove(&node.0) {
            tracing::debug!(node = node.0, "freeing unknown solver node");
            return;
        }
        if let Err(err) = self.taffy.remove(id(node)) {
            tracing::debug!(%err, "solver node removal failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/taffy_solver.rs"]
mod tests;
