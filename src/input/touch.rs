use std::collections::{BTreeMap, HashMap};

use crate::{
    foundation::{
        core::Point,
        error::{SceneryError, SceneryResult},
    },
    render::paint::z_ordered,
    scene::{
        node::{NodeId, PointerEvents, Propagation, TouchHandler},
        tree::NodeTree,
    },
};

/// Gesture phase. `touchcancel` is delivered as [`TouchPhase::End`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

impl TouchPhase {
    /// Map a DOM-style event type (`touchstart`, `touchmove`, `touchend`, `touchcancel`).
    pub fn from_event_type(ty: &str) -> Option<Self> {
        match ty {
            "touchstart" | "start" => Some(Self::Start),
            "touchmove" | "move" => Some(Self::Move),
            "touchend" | "touchcancel" | "end" | "cancel" => Some(Self::End),
            _ => None,
        }
    }
}

/// One contact point in view-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Touch {
    #[serde(alias = "identifier")]
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

impl Touch {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Input delivered by the touch source. `touches` holds the changed contacts, keyed by id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TouchEvent {
    #[serde(rename = "type")]
    pub phase: TouchPhase,
    pub touches: BTreeMap<u64, Touch>,
    pub timestamp: f64,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, timestamp: f64) -> Self {
        Self {
            phase,
            touches: BTreeMap::new(),
            timestamp,
        }
    }

    /// Single-contact event.
    pub fn single(phase: TouchPhase, id: u64, x: f64, y: f64, timestamp: f64) -> Self {
        Self::new(phase, timestamp).with_touch(id, x, y)
    }

    pub fn with_touch(mut self, id: u64, x: f64, y: f64) -> Self {
        self.touches.insert(id, Touch::new(id, x, y));
        self
    }

    pub fn get(&self, id: u64) -> Option<&Touch> {
        self.touches.get(&id)
    }

    /// Lowest-id contact.
    pub fn first(&self) -> Option<&Touch> {
        self.touches.values().next()
    }
}

/// Deepest, topmost node under `point`, searching from `node`.
///
/// Children are tested before their parent, highest `zIndex` first (later siblings win ties since
/// they paint on top). The point is carried into each node's space by undoing its translation and
/// center scale; rotation is not undone. `PointerEvents::None` removes a node's whole subtree from
/// the search and `PointerEvents::BoxNone` only the node itself.
pub fn hit_test(tree: &NodeTree, node: NodeId, point: Point) -> Option<NodeId> {
    let n = tree.get(node)?;
    if n.props.pointer_events == PointerEvents::None {
        return None;
    }
    let local = to_local(tree, node, point)?;

    for child in z_ordered(tree, n).into_iter().rev() {
        if let Some(hit) = hit_test(tree, child, local) {
            return Some(hit);
        }
    }

    if n.props.pointer_events != PointerEvents::BoxNone && n.frame.contains(local) {
        return Some(node);
    }
    None
}

/// Undo `node`'s paint-time translation and center scale. `None` for a degenerate scale.
fn to_local(tree: &NodeTree, node: NodeId, point: Point) -> Option<Point> {
    let n = tree.get(node)?;
    let style = n.merged_style().resolve(None);
    let mut p = point;
    if style.has_translate() {
        p.x -= style.translate_x;
        p.y -= style.translate_y;
    }
    let (sx, sy) = style.scale();
    if sx != 1.0 || sy != 1.0 {
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            return None;
        }
        let c = n.frame.center();
        p.x = c.x + (p.x - c.x) / sx;
        p.y = c.y + (p.y - c.y) / sy;
    }
    Some(p)
}

/// Per-touch target bookkeeping.
///
/// A touch is hit-tested once, on start; moves and the end of the same touch go to that node no
/// matter how the tree changes in between.
#[derive(Clone, Debug, Default)]
pub struct TouchRouter {
    targets: HashMap<u64, NodeId>,
}

impl TouchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target for `touch` in `phase`. Falls back to `root` when nothing is hit or the id is
    /// unknown.
    pub fn resolve_target(
        &mut self,
        tree: &NodeTree,
        root: NodeId,
        phase: TouchPhase,
        touch: &Touch,
    ) -> NodeId {
        match phase {
            TouchPhase::Start => {
                let target = hit_test(tree, root, touch.point()).unwrap_or(root);
                tracing::debug!(id = touch.id, ?target, "touch target resolved");
                self.targets.insert(touch.id, target);
                target
            }
            TouchPhase::Move => self.lookup(touch.id).unwrap_or_else(|err| {
                tracing::debug!(%err, "routing touch to root");
                root
            }),
            TouchPhase::End => match self.targets.remove(&touch.id) {
                Some(target) => target,
                None => {
                    tracing::debug!(
                        err = %SceneryError::UnknownTouchIdentifier(touch.id),
                        "routing touch to root"
                    );
                    root
                }
            },
        }
    }

    pub fn lookup(&self, id: u64) -> SceneryResult<NodeId> {
        self.targets
            .get(&id)
            .copied()
            .ok_or(SceneryError::UnknownTouchIdentifier(id))
    }

    /// `(touch id, target)` for every touch still in progress.
    pub fn active_targets(&self) -> impl Iterator<Item = (u64, NodeId)> + '_ {
        self.targets.iter().map(|(&id, &n)| (id, n))
    }

    pub fn forget(&mut self, id: u64) -> Option<NodeId> {
        self.targets.remove(&id)
    }

    /// Whether an active touch targets `node` or something under it.
    pub fn targets_subtree(&self, tree: &NodeTree, node: NodeId) -> bool {
        self.targets
            .values()
            .any(|&t| t == node || tree.is_ancestor(node, t))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Bubbled past the topmost ancestor.
    Completed,
    /// The handler on this node returned [`Propagation::Stop`].
    Stopped(NodeId),
}

/// Bubble `event` from `target` up through its ancestors, calling each node's handler for the
/// event phase.
///
/// Handlers are collected before any of them runs, so a handler that edits the tree does not
/// change this dispatch.
pub fn dispatch(tree: &NodeTree, target: NodeId, event: &TouchEvent) -> DispatchOutcome {
    let chain: Vec<(NodeId, TouchHandler)> = std::iter::once(target)
        .chain(tree.ancestors(target))
        .filter_map(|id| {
            let h = tree.get(id)?.props.handlers.get(event.phase)?;
            Some((id, h.clone()))
        })
        .collect();

    for (id, handler) in chain {
        if handler(event) == Propagation::Stop {
            return DispatchOutcome::Stopped(id);
        }
    }
    DispatchOutcome::Completed
}

#[cfg(test)]
#[path = "../../tests/unit/input/touch.rs"]
mod tests;
