//! Root container: owns the tree and every piece of per-instance state, and is the only place the
//! engine is driven from outside.
//!
//! The view layer mutates the tree through the host methods (`create_instance`, `append_child`,
//! ..., `commit_update`) and calls [`Engine::reset_after_commit`] once per commit. Paints are
//! coalesced: while a frame is in flight (painted but not yet followed by a [`Engine::tick`]),
//! further requests only set a pending flag, so there is at most one paint per tick and always one
//! after the latest mutation.

use std::{cell::Cell, rc::Rc};

use crate::{
    animation::{
        ticker::{SystemClock, Ticker},
        value::Observer,
    },
    foundation::{
        config::EngineConfig,
        core::Color,
        error::{SceneryError, SceneryResult},
    },
    input::touch::{DispatchOutcome, TouchEvent, TouchPhase, TouchRouter, dispatch},
    layout::{LayoutSolver, adapter::update_layout, taffy_solver::TaffySolver},
    render::{
        cache::{AutoCacheIds, StaleCaches, SurfaceCache},
        cpu::CpuSurface,
        paint::{ContentDrawer, DrawerRegistry, Painter},
        surface::Surface,
    },
    scene::{
        node::{Node, NodeId, NodeKind, Props},
        tree::NodeTree,
    },
};

/// Running totals since the engine was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Paint passes run.
    pub frames_painted: u64,
    /// Layout passes run.
    pub layouts: u64,
    /// Paint requests folded into an already pending frame.
    pub coalesced_requests: u64,
    pub nodes_painted: u64,
    pub drawer_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    /// Subtrees skipped because of a per-node paint failure.
    pub paint_errors: u64,
}

/// Frame-loop flags shared with the repaint observer.
#[derive(Debug, Default)]
struct FrameFlags {
    in_flight: Cell<bool>,
    pending: Cell<bool>,
    /// An observed animated value changed since the last paint.
    dirty: Cell<bool>,
}

/// Retained-mode scene engine over surface type `S`.
pub struct Engine<S: Surface = CpuSurface> {
    tree: NodeTree,
    root: NodeId,
    surface: S,
    solver: Box<dyn LayoutSolver>,
    cache: SurfaceCache<S>,
    auto_ids: AutoCacheIds,
    stale: StaleCaches,
    router: TouchRouter,
    ticker: Ticker,
    drawers: DrawerRegistry,
    config: EngineConfig,
    width: f64,
    height: f64,
    layout_dirty: bool,
    flags: Rc<FrameFlags>,
    observer: Observer,
    /// Removed subtrees waiting for their last touch to end before being destroyed.
    doomed: Vec<NodeId>,
    stats: EngineStats,
}

impl<S: Surface> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("nodes", &self.tree.len())
            .field("size", &(self.width, self.height))
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Engine<CpuSurface> {
    /// CPU-rastered engine driven by the wall clock.
    pub fn new(width: u32, height: u32, config: EngineConfig) -> SceneryResult<Self> {
        let surface = CpuSurface::new(width, height)?;
        Self::with_surface(surface, Ticker::new(SystemClock::new()), config)
    }
}

impl<S: Surface> Engine<S> {
    /// Engine painting into `surface`; its size is the root size.
    pub fn with_surface(surface: S, ticker: Ticker, config: EngineConfig) -> SceneryResult<Self> {
        config.validate()?;
        let mut tree = NodeTree::new();
        let root = tree.create(NodeKind::Root, Props::default());
        let flags = Rc::new(FrameFlags::default());
        let observer: Observer = {
            let flags = Rc::clone(&flags);
            Rc::new(move || flags.dirty.set(true))
        };
        Ok(Self {
            width: f64::from(surface.width()),
            height: f64::from(surface.height()),
            cache: SurfaceCache::new(config.cache_capacity),
            tree,
            root,
            surface,
            solver: Box::new(TaffySolver::new()),
            auto_ids: AutoCacheIds::new(),
            stale: StaleCaches::new(),
            router: TouchRouter::new(),
            ticker,
            drawers: DrawerRegistry::with_defaults(),
            config,
            layout_dirty: true,
            flags,
            observer,
            doomed: Vec::new(),
            stats: EngineStats::default(),
        })
    }

    /// Replace the layout solver.
    pub fn with_solver(mut self, solver: impl LayoutSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self.layout_dirty = true;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> SceneryResult<&Node> {
        self.tree.node(id)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &SurfaceCache<S> {
        &self.cache
    }

    pub fn router(&self) -> &TouchRouter {
        &self.router
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache_evictions: self.cache.stats().evictions,
            ..self.stats
        }
    }

    /// A frame was painted and no tick has completed it yet.
    pub fn is_frame_in_flight(&self) -> bool {
        self.flags.in_flight.get()
    }

    pub fn has_pending_paint(&self) -> bool {
        self.flags.pending.get()
    }

    // --- host interface ---

    /// Create a detached node.
    pub fn create_instance(&mut self, kind: NodeKind, props: Props) -> NodeId {
        self.tree.create(kind, props)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> SceneryResult<()> {
        self.invalidate_cached_path(parent);
        self.tree.append_child(parent, child)?;
        self.doomed.retain(|&d| d != child);
        self.layout_dirty = true;
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> SceneryResult<()> {
        self.invalidate_cached_path(parent);
        self.tree.insert_before(parent, child, before)?;
        self.doomed.retain(|&d| d != child);
        self.layout_dirty = true;
        Ok(())
    }

    /// Detach `child` from `parent`. The subtree is destroyed once no touch in progress targets
    /// any node in it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneryResult<()> {
        self.invalidate_cached_path(parent);
        self.tree.remove_child(parent, child)?;
        self.doomed.push(child);
        self.layout_dirty = true;
        self.sweep_doomed();
        Ok(())
    }

    /// Replace a node's props. Cached renderings of the node and its cached ancestors are
    /// dropped.
    pub fn commit_update(&mut self, node: NodeId, props: Props) -> SceneryResult<()> {
        self.invalidate_cached_path(node);
        self.tree.node_mut(node)?.props = props;
        self.layout_dirty = true;
        Ok(())
    }

    /// End of a view-layer commit: request a layout and paint. Returns whether it painted now.
    pub fn reset_after_commit(&mut self) -> SceneryResult<bool> {
        self.request_paint()
    }

    /// Resize the root and its surface; the next paint lays out again.
    pub fn handle_resize(&mut self, width: f64, height: f64) -> SceneryResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SceneryError::surface(format!(
                "cannot resize root to {width}x{height}"
            )));
        }
        self.surface.reset(width.ceil() as u32, height.ceil() as u32)?;
        self.width = width;
        self.height = height;
        self.layout_dirty = true;
        self.flags.pending.set(true);
        Ok(())
    }

    /// Route each changed touch to its target and bubble the event from there.
    ///
    /// Touches sharing a target dispatch once. Handlers may change animated values; those show
    /// up on the next paint.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> Vec<(NodeId, DispatchOutcome)> {
        let mut targets: Vec<NodeId> = Vec::with_capacity(event.touches.len());
        for touch in event.touches.values() {
            let target = self
                .router
                .resolve_target(&self.tree, self.root, event.phase, touch);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        let outcomes = targets
            .into_iter()
            .map(|t| (t, dispatch(&self.tree, t, event)))
            .collect();
        if event.phase == TouchPhase::End {
            self.sweep_doomed();
        }
        outcomes
    }

    /// Register the content drawer for `kind`. Cached renderings are dropped.
    pub fn register_drawer(&mut self, kind: NodeKind, drawer: ContentDrawer) -> Option<ContentDrawer> {
        self.cache.clear();
        self.drawers.register(kind, drawer)
    }

    /// Drop the cached rendering of `node` and of every cached ancestor. Returns how many entries
    /// were removed.
    pub fn invalidate_cache(&mut self, node: NodeId) -> usize {
        self.invalidate_cached_path(node)
    }

    // --- frame loop ---

    /// Paint now, or mark a paint pending when a frame is already in flight. Returns whether it
    /// painted.
    pub fn request_paint(&mut self) -> SceneryResult<bool> {
        if self.flags.in_flight.get() {
            if !self.flags.pending.replace(true) {
                tracing::debug!("paint coalesced into pending frame");
            }
            self.stats.coalesced_requests += 1;
            return Ok(false);
        }
        self.paint_frame()?;
        Ok(true)
    }

    /// One display refresh: run tick callbacks (timings, scroll momentum), complete the
    /// in-flight frame and repaint if anything asked for it. Returns whether it painted.
    pub fn tick(&mut self) -> SceneryResult<bool> {
        self.ticker.tick();
        self.flags.in_flight.set(false);
        let due = self.flags.pending.replace(false) | self.flags.dirty.get();
        if !due {
            return Ok(false);
        }
        self.paint_frame()?;
        Ok(true)
    }

    /// Lay out (when needed), clear and paint the whole tree.
    #[tracing::instrument(skip_all)]
    pub fn paint_frame(&mut self) -> SceneryResult<()> {
        self.flags.in_flight.set(true);
        self.sweep_doomed();
        if self.layout_dirty {
            self.layout();
        }
        self.flags.dirty.set(false);

        for id in self.stale.drain() {
            if self.cache.remove(&id).is_some() {
                tracing::debug!(id = %id, "dropped stale cache entry");
            }
        }

        self.surface
            .clear(self.config.clear_color.unwrap_or(Color::TRANSPARENT));
        let paint = Painter::new(&self.tree, &self.drawers, &mut self.cache, &mut self.auto_ids)
            .with_observer(Rc::clone(&self.observer))
            .with_stale_caches(self.stale.clone())
            .paint(&mut self.surface, self.root);
        self.surface.flush();
        let paint = paint?;

        self.stats.frames_painted += 1;
        self.stats.nodes_painted += paint.nodes;
        self.stats.drawer_calls += paint.drawer_calls;
        self.stats.cache_hits += paint.cache_hits;
        self.stats.cache_misses += paint.cache_misses;
        self.stats.paint_errors += paint.errors;
        tracing::debug!(nodes = paint.nodes, hidden = paint.hidden, "frame painted");
        Ok(())
    }

    /// Recompute every frame. Solver failures keep the previous frames.
    #[tracing::instrument(skip_all)]
    pub fn layout(&mut self) {
        match update_layout(
            &mut self.tree,
            self.root,
            self.width,
            self.height,
            self.solver.as_mut(),
        ) {
            Ok(report) => {
                self.stats.layouts += 1;
                self.layout_dirty = false;
                if report.skipped_properties > 0 {
                    tracing::debug!(skipped = report.skipped_properties, "layout skipped properties");
                }
            }
            Err(err) => tracing::warn!(%err, "layout failed; keeping previous frames"),
        }
    }

    fn cache_id_of(&self, node: NodeId) -> Option<String> {
        let n = self.tree.get(node)?;
        if !n.props.cache {
            return None;
        }
        n.props
            .cache_id
            .clone()
            .or_else(|| self.auto_ids.get(node).map(str::to_owned))
    }

    fn invalidate_cached_path(&mut self, node: NodeId) -> usize {
        let ids: Vec<String> = std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .filter_map(|n| self.cache_id_of(n))
            .collect();
        ids.iter()
            .filter(|id| self.cache.remove(id).is_some())
            .count()
    }

    /// Destroy removed subtrees that are still detached and no longer touch targets.
    fn sweep_doomed(&mut self) {
        let doomed = std::mem::take(&mut self.doomed);
        for id in doomed {
            if !self.tree.contains(id) || self.tree.parent(id).is_some() {
                continue;
            }
            if self.router.targets_subtree(&self.tree, id) {
                self.doomed.push(id);
                continue;
            }
            match self.tree.destroy(id) {
                Ok(gone) => {
                    for n in gone {
                        if let Some(cache_id) = self.auto_ids.forget(n) {
                            self.cache.remove(&cache_id);
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, ?id, "failed to destroy removed subtree"),
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine/engine.rs"]
mod tests;
