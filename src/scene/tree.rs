//! Arena-backed node tree.
//!
//! Nodes live in slots addressed by [`NodeId`]. Children lists own the structure; `parent` is a
//! plain back-index, so there are no reference cycles. Destroyed slots are recycled and their
//! generation bumped so stale handles stop resolving.

use crate::{
    foundation::error::{SceneryError, SceneryResult},
    scene::node::{Node, NodeId, NodeKind, Props},
};

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Default)]
pub struct NodeTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl std::fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTree")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: NodeKind, props: Props) -> NodeId {
        let node = Node::new(kind, props);
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.node = Some(node);
            return NodeId {
                idx,
                generation: slot.generation,
            };
        }
        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId { idx, generation: 0 }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Like [`get`](Self::get) but a stale handle is an error.
    pub fn node(&self, id: NodeId) -> SceneryResult<&Node> {
        self.get(id)
            .ok_or_else(|| SceneryError::tree(format!("stale node handle {id:?}")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> SceneryResult<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| SceneryError::tree(format!("stale node handle {id:?}")))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Parent, grandparent, ... up to the topmost ancestor.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Strict descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Append `child` as the last child of `parent`, moving it out of any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> SceneryResult<()> {
        self.prepare_attach(parent, child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Insert `child` before `before` in `parent`'s children. Appends when `before` is not a
    /// child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> SceneryResult<()> {
        self.prepare_attach(parent, child)?;
        let p = self.node_mut(parent)?;
        match p.children.iter().position(|&c| c == before) {
            Some(i) => p.children.insert(i, child),
            None => p.children.push(child),
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn prepare_attach(&mut self, parent: NodeId, child: NodeId) -> SceneryResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneryError::tree(format!(
                "cannot attach {child:?} under itself or its descendant {parent:?}"
            )));
        }
        self.unlink(child);
        Ok(())
    }

    /// Detach `child` from `parent`. Fails if it is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneryResult<()> {
        if self.node(child)?.parent != Some(parent) {
            return Err(SceneryError::tree(format!(
                "{child:?} is not a child of {parent:?}"
            )));
        }
        self.detach(child)
    }

    /// Unlink `id` from its parent (if any) and release the subtree's animated-value observers.
    pub fn detach(&mut self, id: NodeId) -> SceneryResult<()> {
        self.node(id)?;
        self.unlink(id);
        self.release_observers(id);
        Ok(())
    }

    /// Detach and free `id` and its whole subtree. Returns the freed handles, root first.
    pub fn destroy(&mut self, id: NodeId) -> SceneryResult<Vec<NodeId>> {
        self.detach(id)?;
        let mut gone = vec![id];
        gone.extend(self.descendants(id));
        for &n in &gone {
            let slot = &mut self.slots[n.idx as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.idx);
            self.len -= 1;
        }
        Ok(gone)
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
    }

    fn release_observers(&self, id: NodeId) {
        for n in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(node) = self.get(n) {
                for s in &node.props.style {
                    s.release_observers();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/tree.rs"]
mod tests;
