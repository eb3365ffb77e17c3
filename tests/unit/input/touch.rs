use std::{cell::RefCell, rc::Rc};

use serde_json::json;

use super::*;
use crate::{
    foundation::core::Frame,
    scene::{
        node::{NodeKind, Props},
        style::Style,
    },
};

fn root(tree: &mut NodeTree) -> NodeId {
    let root = tree.create(NodeKind::Root, Props::default());
    tree.get_mut(root).unwrap().frame = Frame::new(0.0, 0.0, 400.0, 400.0);
    root
}

fn add(tree: &mut NodeTree, parent: NodeId, frame: Frame, props: Props) -> NodeId {
    let id = tree.create(NodeKind::View, props);
    tree.get_mut(id).unwrap().frame = frame;
    tree.append_child(parent, id).unwrap();
    id
}

fn styled(style: serde_json::Value) -> Props {
    Props::new().with_style(Style::from_json(&style).unwrap())
}

#[test]
fn higher_z_wins_on_overlap() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let frame = Frame::new(10.0, 10.0, 100.0, 100.0);
    let b = add(&mut tree, r, frame, styled(json!({ "zIndex": 2 })));
    let a = add(&mut tree, r, frame, styled(json!({ "zIndex": 1 })));
    assert_eq!(hit_test(&tree, r, Point::new(50.0, 50.0)), Some(b));
    assert_ne!(hit_test(&tree, r, Point::new(50.0, 50.0)), Some(a));
}

#[test]
fn later_sibling_wins_a_z_tie() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let frame = Frame::new(10.0, 10.0, 100.0, 100.0);
    add(&mut tree, r, frame, Props::default());
    let second = add(&mut tree, r, frame, Props::default());
    assert_eq!(hit_test(&tree, r, Point::new(50.0, 50.0)), Some(second));
}

#[test]
fn deepest_node_is_the_target() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let outer = add(&mut tree, r, Frame::new(0.0, 0.0, 200.0, 200.0), Props::default());
    let inner = add(&mut tree, outer, Frame::new(50.0, 50.0, 20.0, 20.0), Props::default());
    assert_eq!(hit_test(&tree, r, Point::new(60.0, 60.0)), Some(inner));
    assert_eq!(hit_test(&tree, r, Point::new(150.0, 150.0)), Some(outer));
    assert_eq!(hit_test(&tree, r, Point::new(300.0, 300.0)), Some(r));
}

#[test]
fn frame_edges_follow_the_exclusive_left_top_rule() {
    let mut tree = NodeTree::new();
    let r = tree.create(NodeKind::Root, Props::default());
    tree.get_mut(r).unwrap().frame = Frame::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(hit_test(&tree, r, Point::new(0.0, 5.0)), None);
    assert_eq!(hit_test(&tree, r, Point::new(10.0, 10.0)), Some(r));
}

#[test]
fn pointer_events_none_hides_the_subtree() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let blocked = add(
        &mut tree,
        r,
        Frame::new(0.0, 0.0, 100.0, 100.0),
        Props::new().with_pointer_events(PointerEvents::None),
    );
    add(&mut tree, blocked, Frame::new(10.0, 10.0, 20.0, 20.0), Props::default());
    assert_eq!(hit_test(&tree, r, Point::new(15.0, 15.0)), Some(r));
}

#[test]
fn box_none_passes_through_to_children_only() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let shell = add(
        &mut tree,
        r,
        Frame::new(0.0, 0.0, 100.0, 100.0),
        Props::new().with_pointer_events(PointerEvents::BoxNone),
    );
    let child = add(&mut tree, shell, Frame::new(10.0, 10.0, 20.0, 20.0), Props::default());
    assert_eq!(hit_test(&tree, r, Point::new(15.0, 15.0)), Some(child));
    assert_eq!(hit_test(&tree, r, Point::new(80.0, 80.0)), Some(r));
}

#[test]
fn translation_and_scale_are_undone() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let moved = add(
        &mut tree,
        r,
        Frame::new(0.0, 0.0, 20.0, 20.0),
        styled(json!({ "translateX": 100 })),
    );
    assert_eq!(hit_test(&tree, r, Point::new(110.0, 10.0)), Some(moved));
    assert_eq!(hit_test(&tree, r, Point::new(10.0, 10.0)), Some(r));

    // 20x20 at (200, 200) scaled 2x about its center covers 190..230.
    let scaled = add(
        &mut tree,
        r,
        Frame::new(200.0, 200.0, 20.0, 20.0),
        styled(json!({ "scale": 2 })),
    );
    assert_eq!(hit_test(&tree, r, Point::new(192.0, 228.0)), Some(scaled));
    assert_eq!(hit_test(&tree, r, Point::new(188.0, 210.0)), Some(r));
}

#[test]
fn zero_scale_is_not_hittable() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    add(&mut tree, r, Frame::new(0.0, 0.0, 50.0, 50.0), styled(json!({ "scale": 0 })));
    assert_eq!(hit_test(&tree, r, Point::new(25.0, 25.0)), Some(r));
}

#[test]
fn target_is_fixed_for_the_whole_gesture() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let frame = Frame::new(0.0, 0.0, 100.0, 100.0);
    add(&mut tree, r, frame, styled(json!({ "zIndex": 1 })));
    let b = add(&mut tree, r, frame, styled(json!({ "zIndex": 2 })));

    let mut router = TouchRouter::new();
    let t = Touch::new(7, 50.0, 50.0);
    assert_eq!(router.resolve_target(&tree, r, TouchPhase::Start, &t), b);

    tree.remove_child(r, b).unwrap();
    let moved = Touch::new(7, 300.0, 300.0);
    assert_eq!(router.resolve_target(&tree, r, TouchPhase::Move, &moved), b);
    assert!(router.targets_subtree(&tree, b));
    assert_eq!(router.resolve_target(&tree, r, TouchPhase::End, &moved), b);
    assert!(router.is_empty());
}

#[test]
fn unknown_touch_ids_route_to_root() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    add(&mut tree, r, Frame::new(0.0, 0.0, 100.0, 100.0), Props::default());
    let mut router = TouchRouter::new();
    let t = Touch::new(3, 50.0, 50.0);
    assert_eq!(router.resolve_target(&tree, r, TouchPhase::Move, &t), r);
    assert_eq!(router.resolve_target(&tree, r, TouchPhase::End, &t), r);
    assert!(matches!(
        router.lookup(3),
        Err(SceneryError::UnknownTouchIdentifier(3))
    ));
}

#[test]
fn touches_are_tracked_independently() {
    let mut tree = NodeTree::new();
    let r = root(&mut tree);
    let left = add(&mut tree, r, Frame::new(0.0, 0.0, 100.0, 100.0), Props::default());
    let right = add(&mut tree, r, Frame::new(200.0, 0.0, 100.0, 100.0), Props::default());
    let mut router = TouchRouter::new();
    router.resolve_target(&tree, r, TouchPhase::Start, &Touch::new(1, 50.0, 50.0));
    router.resolve_target(&tree, r, TouchPhase::Start, &Touch::new(2, 250.0, 50.0));
    let mut active: Vec<_> = router.active_targets().collect();
    active.sort();
    assert_eq!(active, vec![(1, left), (2, right)]);
    assert_eq!(router.forget(1), Some(left));
    assert_eq!(router.len(), 1);
}

#[test]
fn dispatch_bubbles_until_stopped() {
    let mut tree = NodeTree::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let recorder = |name: &'static str, result: Propagation| {
        let log = Rc::clone(&log);
        move |_: &TouchEvent| {
            log.borrow_mut().push(name);
            result
        }
    };
    let r = tree.create(
        NodeKind::Root,
        Props::new().on_touch_start(recorder("root", Propagation::Continue)),
    );
    let mid = add(
        &mut tree,
        r,
        Frame::default(),
        Props::new().on_touch_start(recorder("mid", Propagation::Stop)),
    );
    let plain = add(&mut tree, mid, Frame::default(), Props::default());
    let leaf = add(
        &mut tree,
        plain,
        Frame::default(),
        Props::new()
            .on_touch_start(recorder("leaf", Propagation::Continue))
            .on_touch_end(recorder("leaf-end", Propagation::Continue)),
    );

    let start = TouchEvent::single(TouchPhase::Start, 1, 0.0, 0.0, 0.0);
    assert_eq!(dispatch(&tree, leaf, &start), DispatchOutcome::Stopped(mid));
    assert_eq!(*log.borrow(), vec!["leaf", "mid"]);

    log.borrow_mut().clear();
    let end = TouchEvent::single(TouchPhase::End, 1, 0.0, 0.0, 0.0);
    assert_eq!(dispatch(&tree, leaf, &end), DispatchOutcome::Completed);
    assert_eq!(*log.borrow(), vec!["leaf-end"]);

    log.borrow_mut().clear();
    assert_eq!(dispatch(&tree, plain, &start), DispatchOutcome::Stopped(mid));
    assert_eq!(*log.borrow(), vec!["mid"]);
}

#[test]
fn event_json_uses_the_touch_source_shape() {
    let ev: TouchEvent = serde_json::from_value(json!({
        "type": "move",
        "touches": { "4": { "identifier": 4, "x": 1.5, "y": 2.0 } },
        "timestamp": 16.0
    }))
    .unwrap();
    assert_eq!(ev.phase, TouchPhase::Move);
    assert_eq!(ev.first(), Some(&Touch::new(4, 1.5, 2.0)));
    assert_eq!(TouchPhase::from_event_type("touchcancel"), Some(TouchPhase::End));
    assert_eq!(TouchPhase::from_event_type("click"), None);
}
