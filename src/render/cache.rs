use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use crate::{
    foundation::{
        core::{Affine, Rect},
        error::{SceneryError, SceneryResult},
    },
    render::surface::Surface,
    scene::node::NodeId,
};

/// A memoized subtree rendering.
#[derive(Debug)]
pub struct CachedSurface<S> {
    pub id: String,
    pub surface: S,
    /// Maps root space onto the offscreen surface (the box origin lands on `(0, 0)`).
    pub transform: Affine,
    /// Root-space box the surface was rendered for.
    pub bounds: Rect,
}

impl<S: Surface> CachedSurface<S> {
    /// Where the surface's pixels land in root space, at 1:1 scale.
    pub fn blit_rect(&self) -> Rect {
        Rect::new(
            self.bounds.x0,
            self.bounds.y0,
            self.bounds.x0 + f64::from(self.surface.width()),
            self.bounds.y0 + f64::from(self.surface.height()),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub created: u64,
    pub reused: u64,
    pub evictions: u64,
}

/// Fixed-capacity offscreen surface registry with first-in-first-out eviction.
///
/// Evicted surfaces are reset and handed to the entry that displaced them instead of being
/// dropped, so a full cache stops allocating.
#[derive(Debug)]
pub struct SurfaceCache<S> {
    capacity: usize,
    entries: HashMap<String, CachedSurface<S>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    stats: CacheStats,
}

impl<S: Surface> SurfaceCache<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&CachedSurface<S>> {
        self.entries.get(id)
    }

    /// Ids in insertion order, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Allocate (or recycle) a surface for the box `x, y, width, height` under `id`.
    ///
    /// An existing entry for `id` is reset in place and keeps its position in the eviction
    /// order. Otherwise, at capacity, the oldest entry is evicted and its surface reused.
    pub fn create(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        id: &str,
        template: &S,
    ) -> SceneryResult<&mut CachedSurface<S>> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SceneryError::surface(format!(
                "cache box {width}x{height} for `{id}` is empty"
            )));
        }
        let (w, h) = (width.ceil() as u32, height.ceil() as u32);
        let bounds = Rect::new(x, y, x + width, y + height);
        let transform = Affine::translate((-x, -y));

        if let Some(mut entry) = self.entries.remove(id) {
            entry.surface.reset(w, h)?;
            entry.bounds = bounds;
            entry.transform = transform;
            self.stats.reused += 1;
            return Ok(self.entries.entry(id.to_owned()).or_insert(entry));
        }

        let surface = match self.evict_oldest() {
            Some(mut old) => {
                old.surface.reset(w, h)?;
                self.stats.reused += 1;
                old.surface
            }
            None => {
                self.stats.created += 1;
                template.create_offscreen(w, h)?
            }
        };
        tracing::debug!(id, w, h, "cache surface created");
        self.order.push_back(id.to_owned());
        Ok(self
            .entries
            .entry(id.to_owned())
            .or_insert(CachedSurface {
                id: id.to_owned(),
                surface,
                transform,
                bounds,
            }))
    }

    /// Borrow an entry out of the cache for painting. Its eviction slot is kept for
    /// [`SurfaceCache::insert`].
    pub fn take(&mut self, id: &str) -> Option<CachedSurface<S>> {
        self.entries.remove(id)
    }

    /// Put an entry back (e.g. after painting into it), evicting the oldest one when full.
    ///
    /// An id that still holds an eviction slot keeps it; others go to the back. Returns the
    /// evicted entry, if any.
    pub fn insert(&mut self, entry: CachedSurface<S>) -> Option<CachedSurface<S>> {
        let mut evicted = None;
        if self.entries.contains_key(&entry.id) {
            self.entries.remove(&entry.id);
        } else if self.order.contains(&entry.id) {
            evicted = self.evict_oldest_except(&entry.id);
        } else {
            evicted = self.evict_oldest();
            self.order.push_back(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);
        evicted
    }

    pub fn remove(&mut self, id: &str) -> Option<CachedSurface<S>> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|o| o != id);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) -> Option<CachedSurface<S>> {
        self.evict_oldest_except("")
    }

    /// Evict the oldest entry, leaving the slot of `keep` (an entry taken out for painting) in
    /// place.
    fn evict_oldest_except(&mut self, keep: &str) -> Option<CachedSurface<S>> {
        if self.entries.len() < self.capacity {
            return None;
        }
        let mut kept = false;
        let mut evicted = None;
        while let Some(id) = self.order.pop_front() {
            if id == keep {
                kept = true;
                continue;
            }
            if let Some(entry) = self.entries.remove(&id) {
                tracing::debug!(id = %id, "cache entry evicted");
                self.stats.evictions += 1;
                evicted = Some(entry);
                break;
            }
        }
        if kept {
            self.order.push_front(keep.to_owned());
        }
        evicted
    }
}

/// Engine-generated cache ids, one per node, stable for the node's lifetime.
#[derive(Clone, Debug, Default)]
pub struct AutoCacheIds {
    next: u64,
    ids: HashMap<NodeId, String>,
}

impl AutoCacheIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_for(&mut self, node: NodeId) -> String {
        if let Some(id) = self.ids.get(&node) {
            return id.clone();
        }
        self.next += 1;
        let id = format!("auto-{}", self.next);
        self.ids.insert(node, id.clone());
        id
    }

    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.ids.get(&node).map(String::as_str)
    }

    /// Drop the id of a destroyed node. Returns it so the cache entry can go too.
    pub fn forget(&mut self, node: NodeId) -> Option<String> {
        self.ids.remove(&node)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Cache ids whose content changed while being painted offscreen.
///
/// Observers installed during a cached subtree's paint mark its id here; the engine drops those
/// entries before the next frame.
#[derive(Clone, Debug, Default)]
pub struct StaleCaches(Rc<RefCell<Vec<String>>>);

impl StaleCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, id: &str) {
        let mut ids = self.0.borrow_mut();
        if !ids.iter().any(|i| i == id) {
            ids.push(id.to_owned());
        }
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
