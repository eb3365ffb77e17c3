use std::rc::Rc;

use super::*;
use crate::{
    animation::value::{AnimatedValue, Observer},
    scene::style::Style,
};

fn view(tree: &mut NodeTree) -> NodeId {
    tree.create(NodeKind::View, Props::default())
}

#[test]
fn append_and_parent_links() {
    let mut t = NodeTree::new();
    let root = t.create(NodeKind::Root, Props::default());
    let a = view(&mut t);
    let b = view(&mut t);
    t.append_child(root, a).unwrap();
    t.append_child(root, b).unwrap();
    assert_eq!(t.children(root), &[a, b]);
    assert_eq!(t.parent(a), Some(root));
    assert_eq!(t.len(), 3);
}

#[test]
fn attaching_moves_between_parents() {
    let mut t = NodeTree::new();
    let p1 = view(&mut t);
    let p2 = view(&mut t);
    let c = view(&mut t);
    t.append_child(p1, c).unwrap();
    t.append_child(p2, c).unwrap();
    assert!(t.children(p1).is_empty());
    assert_eq!(t.children(p2), &[c]);
    assert_eq!(t.parent(c), Some(p2));
}

#[test]
fn insert_before_and_fallback_append() {
    let mut t = NodeTree::new();
    let p = view(&mut t);
    let a = view(&mut t);
    let b = view(&mut t);
    let c = view(&mut t);
    let stranger = view(&mut t);
    t.append_child(p, a).unwrap();
    t.insert_before(p, b, a).unwrap();
    t.insert_before(p, c, stranger).unwrap();
    assert_eq!(t.children(p), &[b, a, c]);

    // Reordering within the same parent.
    t.insert_before(p, c, b).unwrap();
    assert_eq!(t.children(p), &[c, b, a]);
}

#[test]
fn cycles_are_rejected() {
    let mut t = NodeTree::new();
    let a = view(&mut t);
    let b = view(&mut t);
    t.append_child(a, b).unwrap();
    assert!(matches!(t.append_child(b, a), Err(SceneryError::Tree(_))));
    assert!(matches!(t.append_child(a, a), Err(SceneryError::Tree(_))));
    assert_eq!(t.parent(b), Some(a));
}

#[test]
fn remove_child_requires_membership() {
    let mut t = NodeTree::new();
    let p = view(&mut t);
    let q = view(&mut t);
    let c = view(&mut t);
    t.append_child(p, c).unwrap();
    assert!(t.remove_child(q, c).is_err());
    t.remove_child(p, c).unwrap();
    assert_eq!(t.parent(c), None);
    assert!(t.children(p).is_empty());
    assert!(t.contains(c));
}

#[test]
fn destroy_frees_subtree_and_invalidates_handles() {
    let mut t = NodeTree::new();
    let root = view(&mut t);
    let a = view(&mut t);
    let a1 = view(&mut t);
    let a2 = view(&mut t);
    t.append_child(root, a).unwrap();
    t.append_child(a, a1).unwrap();
    t.append_child(a1, a2).unwrap();

    let gone = t.destroy(a).unwrap();
    assert_eq!(gone, vec![a, a1, a2]);
    assert!(!t.contains(a) && !t.contains(a1) && !t.contains(a2));
    assert!(t.children(root).is_empty());
    assert_eq!(t.len(), 1);
    assert!(t.destroy(a).is_err());

    // Slot reuse bumps the generation.
    let fresh = view(&mut t);
    assert!(t.contains(fresh));
    assert!(!t.contains(a2));
    assert!(gone.iter().any(|g| g.index() == fresh.index()));
}

#[test]
fn ancestry_queries() {
    let mut t = NodeTree::new();
    let r = view(&mut t);
    let a = view(&mut t);
    let b = view(&mut t);
    let c = view(&mut t);
    t.append_child(r, a).unwrap();
    t.append_child(a, b).unwrap();
    t.append_child(r, c).unwrap();
    assert_eq!(t.ancestors(b), vec![a, r]);
    assert!(t.is_ancestor(r, b));
    assert!(!t.is_ancestor(c, b));
    assert!(!t.is_ancestor(b, b));
    assert_eq!(t.descendants(r), vec![a, b, c]);
}

#[test]
fn detach_releases_animated_observers() {
    let mut t = NodeTree::new();
    let p = view(&mut t);
    let opacity = AnimatedValue::new(1.0);
    let style = Style {
        opacity: Some((&opacity).into()),
        ..Style::default()
    };
    let c = t.create(NodeKind::View, Props::new().with_style(style));
    t.append_child(p, c).unwrap();

    let obs: Observer = Rc::new(|| {});
    t.get(c).unwrap().merged_style().resolve(Some(&obs));
    assert!(opacity.has_observer());

    t.detach(c).unwrap();
    assert!(!opacity.has_observer());
}
