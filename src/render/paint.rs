use std::{collections::HashMap, rc::Rc};

use smallvec::SmallVec;

use crate::{
    animation::value::Observer,
    foundation::{
        core::Frame,
        error::{SceneryError, SceneryResult},
    },
    render::{
        cache::{AutoCacheIds, StaleCaches, SurfaceCache},
        path::rounded_rect_path,
        surface::{Canvas, FillStyle, Surface},
    },
    scene::{
        node::{Node, NodeContent, NodeId, NodeKind},
        style::ResolvedStyle,
        tree::NodeTree,
    },
};

/// Kind-specific content painter (text, images, custom drawing).
///
/// Called with the node's transform, alpha and clip already applied; coordinates are root space,
/// so `node.frame` is where the content goes.
pub type ContentDrawer = Rc<dyn Fn(&mut dyn Canvas, &Node)>;

/// Content drawers keyed by node kind.
#[derive(Clone, Default)]
pub struct DrawerRegistry {
    drawers: HashMap<NodeKind, ContentDrawer>,
}

impl std::fmt::Debug for DrawerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.drawers.keys()).finish()
    }
}

impl DrawerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in image drawer.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register(NodeKind::Image, Rc::new(draw_image_content));
        r
    }

    /// Returns the drawer previously registered for `kind`.
    pub fn register(&mut self, kind: NodeKind, drawer: ContentDrawer) -> Option<ContentDrawer> {
        self.drawers.insert(kind, drawer)
    }

    pub fn get(&self, kind: &NodeKind) -> Option<&ContentDrawer> {
        self.drawers.get(kind)
    }

    /// The node's own drawer, else the one for its kind.
    pub fn resolve(&self, node: &Node) -> Option<ContentDrawer> {
        node.props
            .drawer
            .clone()
            .or_else(|| self.drawers.get(&node.kind).cloned())
    }
}

/// Stretch decoded image content over the node's frame.
pub fn draw_image_content(canvas: &mut dyn Canvas, node: &Node) {
    if let Some(NodeContent::Image(image)) = &node.props.content {
        canvas.draw_image(image, node.frame.rect());
    }
}

/// Counters for one paint pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub nodes: u64,
    /// Nodes (with their subtrees) skipped for `opacity <= 0`.
    pub hidden: u64,
    pub drawer_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Cacheable nodes drawn directly because their content was not ready or no surface could
    /// be made.
    pub cache_bypasses: u64,
    pub errors: u64,
}

/// One paint pass over a node tree.
pub struct Painter<'a, S: Surface> {
    tree: &'a NodeTree,
    drawers: &'a DrawerRegistry,
    cache: &'a mut SurfaceCache<S>,
    auto_ids: &'a mut AutoCacheIds,
    observer: Option<Observer>,
    stale: Option<StaleCaches>,
    stats: PaintStats,
}

impl<'a, S: Surface> Painter<'a, S> {
    pub fn new(
        tree: &'a NodeTree,
        drawers: &'a DrawerRegistry,
        cache: &'a mut SurfaceCache<S>,
        auto_ids: &'a mut AutoCacheIds,
    ) -> Self {
        Self {
            tree,
            drawers,
            cache,
            auto_ids,
            observer: None,
            stale: None,
            stats: PaintStats::default(),
        }
    }

    /// Register `observer` on every animated property read during the pass.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Record cache ids whose content changes after being painted offscreen.
    pub fn with_stale_caches(mut self, stale: StaleCaches) -> Self {
        self.stale = Some(stale);
        self
    }

    /// Paint `node` and its subtree onto `surface`.
    ///
    /// Only a stale `node` is an error; problems below it are logged and contained to the
    /// offending subtree.
    pub fn paint(mut self, surface: &mut S, node: NodeId) -> SceneryResult<PaintStats> {
        self.paint_node(surface, node)?;
        Ok(self.stats)
    }

    fn paint_node(&mut self, target: &mut S, id: NodeId) -> SceneryResult<()> {
        let tree = self.tree;
        let node = tree.node(id)?;
        // A cached node's own fields end up in its offscreen surface, so they are observed
        // under the marking observer like its subtree.
        let cache_id = (node.props.cache && node.props.content_ready).then(|| {
            node.props
                .cache_id
                .clone()
                .unwrap_or_else(|| self.auto_ids.id_for(id))
        });
        let observer = match &cache_id {
            Some(cache_id) => self.marking_observer(cache_id),
            None => self.observer.clone(),
        };
        let style = node.merged_style().resolve(observer.as_ref());
        if style.opacity.is_nan() || style.opacity <= 0.0 {
            self.stats.hidden += 1;
            return Ok(());
        }
        self.stats.nodes += 1;

        let saved = style.needs_save() || style.opacity < 1.0;
        if saved {
            target.save();
        }
        if style.opacity < 1.0 {
            target.set_global_alpha(target.global_alpha() * style.opacity);
        }
        apply_transform(target, node.frame, &style);

        if let Some(cache_id) = cache_id {
            self.paint_cached(target, node, &style, cache_id, observer);
        } else {
            if node.props.cache {
                self.stats.cache_bypasses += 1;
            }
            self.paint_content(target, node, &style);
        }

        if saved {
            target.restore();
        }
        Ok(())
    }

    /// Background, border, clip, content and children.
    fn paint_content(&mut self, target: &mut S, node: &Node, style: &ResolvedStyle) {
        if style.needs_path() {
            let path = rounded_rect_path(node.frame, style.radii);
            if style.clips() {
                target.clip(&path);
            }
            if !style.background_color.is_transparent() {
                target.fill(
                    &path,
                    &FillStyle::solid(style.background_color).with_shadow(style.shadow),
                );
            }
            if style.has_border()
                && let Some(color) = style.border_color
            {
                target.stroke(&path, color, style.border_width);
            }
        }

        if let Some(drawer) = self.drawers.resolve(node) {
            let canvas: &mut dyn Canvas = &mut *target;
            drawer(canvas, node);
            self.stats.drawer_calls += 1;
        }

        for child in z_ordered(self.tree, node) {
            if let Err(err) = self.paint_node(target, child) {
                tracing::warn!(%err, ?child, "skipping child");
                self.stats.errors += 1;
            }
        }
    }

    /// The pass observer, wrapped to also mark `cache_id` stale when stale tracking is on.
    fn marking_observer(&self, cache_id: &str) -> Option<Observer> {
        let Some(stale) = self.stale.clone() else {
            return self.observer.clone();
        };
        let marked = cache_id.to_owned();
        let inner = self.observer.clone();
        Some(Rc::new(move || {
            stale.mark(&marked);
            if let Some(o) = &inner {
                o();
            }
        }))
    }

    fn paint_cached(
        &mut self,
        target: &mut S,
        node: &Node,
        style: &ResolvedStyle,
        cache_id: String,
        observer: Option<Observer>,
    ) {
        let frame = node.frame;

        if let Some(entry) = self.cache.get(&cache_id)
            && entry.bounds == frame.rect()
        {
            target.blit(&entry.surface, entry.blit_rect());
            self.stats.cache_hits += 1;
            return;
        }
        self.stats.cache_misses += 1;

        let created = self
            .cache
            .create(frame.x, frame.y, frame.width, frame.height, &cache_id, target)
            .map(|_| ());
        let entry = created.and_then(|()| {
            self.cache
                .take(&cache_id)
                .ok_or_else(|| SceneryError::surface("cache entry vanished"))
        });
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(%err, id = %cache_id, "drawing cacheable node directly");
                self.stats.cache_bypasses += 1;
                self.paint_content(target, node, style);
                return;
            }
        };

        let outer = std::mem::replace(&mut self.observer, observer);
        entry.surface.concat(entry.transform);
        self.paint_content(&mut entry.surface, node, style);
        entry.surface.flush();
        self.observer = outer;

        target.blit(&entry.surface, entry.blit_rect());
        self.cache.insert(entry);
    }
}

/// Translate, then rotate and scale about the frame center.
fn apply_transform(canvas: &mut dyn Canvas, frame: Frame, style: &ResolvedStyle) {
    if style.has_translate() {
        canvas.translate(style.translate_x, style.translate_y);
    }
    if style.has_rotate_or_scale() {
        let c = frame.center();
        canvas.translate(c.x, c.y);
        if style.rotate != 0.0 {
            canvas.rotate(style.rotate);
        }
        let (sx, sy) = style.scale();
        if sx != 1.0 || sy != 1.0 {
            canvas.scale(sx, sy);
        }
        canvas.translate(-c.x, -c.y);
    }
}

/// Children in paint order: ascending `zIndex`, ties in insertion order.
pub fn z_ordered(tree: &NodeTree, node: &Node) -> SmallVec<[NodeId; 8]> {
    let mut keyed: SmallVec<[(f64, NodeId); 8]> = node
        .children()
        .iter()
        .map(|&c| {
            let z = tree.get(c).map_or(0.0, |n| n.merged_style().z_index());
            (z, c)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/paint.rs"]
mod tests;
