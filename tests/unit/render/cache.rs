use super::*;
use crate::render::recording::RecordingSurface;

fn template() -> RecordingSurface {
    RecordingSurface::new(100, 100)
}

#[test]
fn create_sizes_surface_and_maps_box_origin() {
    let mut cache = SurfaceCache::new(4);
    let entry = cache
        .create(10.0, 20.0, 30.5, 40.0, "a", &template())
        .unwrap();
    assert_eq!((entry.surface.width(), entry.surface.height()), (31, 40));
    assert_eq!(entry.bounds, Rect::new(10.0, 20.0, 40.5, 60.0));
    assert_eq!(entry.transform * kurbo::Point::new(10.0, 20.0), kurbo::Point::ZERO);
    assert_eq!(entry.blit_rect(), Rect::new(10.0, 20.0, 41.0, 60.0));
    assert!(cache.contains("a"));
    assert_eq!(cache.stats().created, 1);
}

#[test]
fn fifo_eviction_drops_the_first_inserted_id() {
    let mut cache = SurfaceCache::new(3);
    for id in ["a", "b", "c", "d"] {
        cache.create(0.0, 0.0, 10.0, 10.0, id, &template()).unwrap();
    }
    assert!(cache.get("a").is_none());
    assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    assert_eq!(cache.len(), 3);
    let stats = cache.stats();
    assert_eq!((stats.created, stats.reused, stats.evictions), (3, 1, 1));
}

#[test]
fn access_does_not_refresh_eviction_order() {
    let mut cache = SurfaceCache::new(2);
    cache.create(0.0, 0.0, 1.0, 1.0, "a", &template()).unwrap();
    cache.create(0.0, 0.0, 1.0, 1.0, "b", &template()).unwrap();
    assert!(cache.get("a").is_some());
    cache.create(0.0, 0.0, 1.0, 1.0, "c", &template()).unwrap();
    assert!(!cache.contains("a"));
    assert!(cache.contains("b"));
}

#[test]
fn evicted_surface_is_reset_to_new_size() {
    let mut cache = SurfaceCache::new(1);
    {
        let a = cache.create(0.0, 0.0, 5.0, 5.0, "a", &template()).unwrap();
        a.surface.clear(crate::foundation::core::Color::WHITE);
    }
    let b = cache.create(0.0, 0.0, 8.0, 2.0, "b", &template()).unwrap();
    assert_eq!((b.surface.width(), b.surface.height()), (8, 2));
    assert!(b.surface.commands().is_empty());
}

#[test]
fn recreating_an_id_keeps_its_slot() {
    let mut cache = SurfaceCache::new(2);
    cache.create(0.0, 0.0, 1.0, 1.0, "a", &template()).unwrap();
    cache.create(0.0, 0.0, 1.0, 1.0, "b", &template()).unwrap();
    cache.create(5.0, 5.0, 2.0, 2.0, "a", &template()).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(cache.get("a").unwrap().bounds, Rect::new(5.0, 5.0, 7.0, 7.0));
}

#[test]
fn empty_box_is_rejected() {
    let mut cache: SurfaceCache<RecordingSurface> = SurfaceCache::new(2);
    assert!(cache.create(0.0, 0.0, 0.0, 5.0, "a", &template()).is_err());
    assert!(cache.create(0.0, 0.0, f64::NAN, 5.0, "a", &template()).is_err());
    assert!(cache.is_empty());
}

#[test]
fn remove_then_insert_round_trips_and_evicts_when_full() {
    let mut cache = SurfaceCache::new(2);
    cache.create(0.0, 0.0, 1.0, 1.0, "a", &template()).unwrap();
    let a = cache.remove("a").unwrap();
    assert!(cache.is_empty());
    cache.create(0.0, 0.0, 1.0, 1.0, "b", &template()).unwrap();
    cache.create(0.0, 0.0, 1.0, 1.0, "c", &template()).unwrap();
    let evicted = cache.insert(a).unwrap();
    assert_eq!(evicted.id, "b");
    assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["c", "a"]);
    cache.clear();
    assert!(cache.is_empty() && cache.ids().next().is_none());
}

#[test]
fn taken_entry_keeps_its_slot_through_an_eviction() {
    let mut cache = SurfaceCache::new(2);
    cache.create(0.0, 0.0, 1.0, 1.0, "a", &template()).unwrap();
    cache.create(0.0, 0.0, 1.0, 1.0, "b", &template()).unwrap();
    let a = cache.take("a").unwrap();
    assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["a", "b"]);

    // Room is left for `a`; filling it pushes `a` over capacity on return.
    cache.create(0.0, 0.0, 1.0, 1.0, "c", &template()).unwrap();
    let evicted = cache.insert(a).unwrap();
    assert_eq!(evicted.id, "b");
    assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["a", "c"]);
    assert_eq!(cache.len(), 2);
}

#[test]
fn auto_ids_are_stable_per_node() {
    let mut tree = crate::scene::tree::NodeTree::new();
    let a = tree.create(crate::scene::node::NodeKind::View, Default::default());
    let b = tree.create(crate::scene::node::NodeKind::View, Default::default());
    let mut ids = AutoCacheIds::new();
    let ia = ids.id_for(a);
    assert_eq!(ids.id_for(a), ia);
    assert_ne!(ids.id_for(b), ia);
    assert_eq!(ids.forget(a), Some(ia.clone()));
    assert_ne!(ids.id_for(a), ia);
    assert_eq!(ids.len(), 2);
}

#[test]
fn stale_caches_dedupe_and_drain() {
    let stale = StaleCaches::new();
    let shared = stale.clone();
    shared.mark("x");
    shared.mark("x");
    stale.mark("y");
    assert_eq!(stale.drain(), vec!["x".to_string(), "y".to_string()]);
    assert!(stale.is_empty());
}
