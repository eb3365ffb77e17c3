use smallvec::SmallVec;

use crate::{
    foundation::{core::Frame, error::SceneryResult},
    layout::{Direction, Edge, LayoutProperty, LayoutSolver, LayoutValue, SolverNode},
    scene::{
        node::{LayoutCallback, NodeId},
        style::{Dimension, Edges, Style},
        tree::NodeTree,
    },
};

pub type PropertyList = SmallVec<[(LayoutProperty, LayoutValue); 16]>;

fn dim(d: Dimension) -> LayoutValue {
    match d {
        Dimension::Points(v) => LayoutValue::Points(v),
        Dimension::Percent(v) => LayoutValue::Percent(v),
        Dimension::Auto => LayoutValue::Auto,
    }
}

fn push_edges(
    out: &mut PropertyList,
    edges: &Edges,
    make: impl Fn(Edge) -> LayoutProperty,
) {
    // `All` first so specific edges override it regardless of declaration order.
    for (edge, v) in [
        (Edge::All, edges.all),
        (Edge::Left, edges.left),
        (Edge::Top, edges.top),
        (Edge::Right, edges.right),
        (Edge::Bottom, edges.bottom),
    ] {
        if let Some(v) = v {
            out.push((make(edge), dim(v)));
        }
    }
}

/// Solver calls for the layout fields of a merged style, in application order.
///
/// `flex` precedes `flexGrow`/`flexShrink` so the explicit fields win over the shorthand.
pub fn style_properties(style: &Style) -> PropertyList {
    use LayoutProperty as P;
    let mut out = PropertyList::new();
    let mut dims = |p: P, d: Option<Dimension>| {
        if let Some(d) = d {
            out.push((p, dim(d)));
        }
    };
    dims(P::Width, style.width);
    dims(P::Height, style.height);
    dims(P::MinWidth, style.min_width);
    dims(P::MaxWidth, style.max_width);
    dims(P::MinHeight, style.min_height);
    dims(P::MaxHeight, style.max_height);
    dims(P::Flex, style.flex);
    dims(P::FlexGrow, style.flex_grow);
    dims(P::FlexShrink, style.flex_shrink);
    dims(P::AspectRatio, style.aspect_ratio);

    if let Some(j) = style.justify_content {
        out.push((P::JustifyContent, LayoutValue::Justify(j)));
    }
    for (p, a) in [
        (P::AlignItems, style.align_items),
        (P::AlignSelf, style.align_self),
        (P::AlignContent, style.align_content),
    ] {
        if let Some(a) = a {
            out.push((p, LayoutValue::Align(a)));
        }
    }
    if let Some(w) = style.flex_wrap {
        out.push((P::FlexWrap, LayoutValue::Wrap(w)));
    }
    if let Some(d) = style.flex_direction {
        out.push((P::FlexDirection, LayoutValue::FlexDirection(d)));
    }
    if let Some(t) = style.position {
        out.push((P::PositionType, LayoutValue::PositionType(t)));
    }

    push_edges(&mut out, &style.inset, P::Position);
    push_edges(&mut out, &style.padding, P::Padding);
    push_edges(&mut out, &style.margin, P::Margin);
    push_edges(&mut out, &style.border_width, P::Border);
    out
}

/// Apply a style to a solver node. Properties the solver rejects are logged and skipped.
///
/// Returns how many properties were skipped.
pub fn apply_style(solver: &mut dyn LayoutSolver, node: SolverNode, style: &Style) -> usize {
    let mut skipped = 0;
    for (p, v) in style_properties(style) {
        if let Err(err) = solver.set_property(node, p, v) {
            tracing::warn!(%err, "skipping layout property");
            skipped += 1;
        }
    }
    skipped
}

/// Summary of one layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub nodes: usize,
    pub skipped_properties: usize,
}

/// Lay out the subtree under `root` at `width x height` and write every node's root-space frame.
///
/// Solver nodes are built fresh for the pass and freed before returning. `on_layout` callbacks run
/// after all frames are written.
#[tracing::instrument(skip(tree, solver))]
pub fn update_layout(
    tree: &mut NodeTree,
    root: NodeId,
    width: f64,
    height: f64,
    solver: &mut dyn LayoutSolver,
) -> SceneryResult<LayoutReport> {
    tree.node(root)?;

    let mut order: Vec<(NodeId, SolverNode)> = Vec::new();
    let result = build_and_compute(tree, root, width, height, solver, &mut order);
    for &(_, s) in order.iter().rev() {
        solver.free(s);
    }
    let (report, callbacks) = result?;

    for (cb, frame) in callbacks {
        cb(frame);
    }
    tracing::debug!(nodes = report.nodes, "layout pass");
    Ok(report)
}

fn build_and_compute(
    tree: &mut NodeTree,
    root: NodeId,
    width: f64,
    height: f64,
    solver: &mut dyn LayoutSolver,
    order: &mut Vec<(NodeId, SolverNode)>,
) -> SceneryResult<(LayoutReport, Vec<(LayoutCallback, Frame)>)> {
    let mut report = LayoutReport::default();

    // Pre-order walk; parents are always created before their children.
    let mut stack: Vec<(NodeId, Option<(SolverNode, usize)>)> = vec![(root, None)];
    while let Some((id, parent)) = stack.pop() {
        let snode = solver.create_node()?;
        order.push((id, snode));
        report.skipped_properties += apply_style(solver, snode, &tree.node(id)?.merged_style());
        if let Some((p, index)) = parent {
            solver.insert_child(p, snode, index)?;
        }
        let children = tree.children(id);
        for (i, &c) in children.iter().enumerate().rev() {
            stack.push((c, Some((snode, i))));
        }
    }
    report.nodes = order.len();

    let root_snode = order[0].1;
    solver.set_property(root_snode, LayoutProperty::Width, LayoutValue::Points(width))?;
    solver.set_property(root_snode, LayoutProperty::Height, LayoutValue::Points(height))?;
    solver.calculate_layout(root_snode, width, height, Direction::Inherit)?;

    let mut callbacks = Vec::new();
    for &(id, snode) in order.iter() {
        let computed = solver.computed_layout(snode)?;
        let origin = match tree.parent(id).filter(|_| id != root) {
            Some(p) => {
                let pf = tree.node(p)?.frame;
                (pf.x, pf.y)
            }
            None => (0.0, 0.0),
        };
        let frame = Frame::new(
            origin.0 + computed.left,
            origin.1 + computed.top,
            computed.width,
            computed.height,
        );
        let node = tree.node_mut(id)?;
        node.frame = frame;
        if let Some(cb) = &node.props.on_layout {
            callbacks.push((cb.clone(), frame));
        }
    }
    Ok((report, callbacks))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/adapter.rs"]
mod tests;
