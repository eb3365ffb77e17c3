use std::{fmt, rc::Rc};

use smallvec::SmallVec;

use crate::{
    foundation::core::{Frame, ImageData},
    input::touch::{TouchEvent, TouchPhase},
    render::paint::ContentDrawer,
    scene::style::Style,
};

/// Generation-checked handle to a node in a [`NodeTree`](super::tree::NodeTree).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub const fn index(self) -> u32 {
        self.idx
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Element tag. Selects the content drawer and a few kind-specific behaviors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    View,
    Text,
    Image,
    Scrollable,
    ScrollContent,
    Touchable,
    Custom(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Root" | "root" => Self::Root,
            "View" | "view" => Self::View,
            "Text" | "text" => Self::Text,
            "Image" | "image" => Self::Image,
            "Scrollable" | "scrollable" => Self::Scrollable,
            "ScrollContent" | "scrollContent" => Self::ScrollContent,
            "Touchable" | "touchable" => Self::Touchable,
            other => Self::Custom(other.to_owned()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Root => "Root",
            Self::View => "View",
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Scrollable => "Scrollable",
            Self::ScrollContent => "ScrollContent",
            Self::Touchable => "Touchable",
            Self::Custom(tag) => tag,
        }
    }
}

/// Hit-test eligibility of a node and its subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerEvents {
    #[default]
    Auto,
    /// Neither the node nor its subtree can be hit.
    None,
    /// Children can be hit; the node itself cannot.
    BoxNone,
}

/// Returned by touch handlers to continue or stop bubbling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    Stop,
}

pub type TouchHandler = Rc<dyn Fn(&TouchEvent) -> Propagation>;

/// Invoked with the freshly computed frame after each layout pass.
pub type LayoutCallback = Rc<dyn Fn(Frame)>;

#[derive(Clone, Default)]
pub struct TouchHandlers {
    pub on_start: Option<TouchHandler>,
    pub on_move: Option<TouchHandler>,
    pub on_end: Option<TouchHandler>,
}

impl TouchHandlers {
    pub fn get(&self, phase: TouchPhase) -> Option<&TouchHandler> {
        match phase {
            TouchPhase::Start => self.on_start.as_ref(),
            TouchPhase::Move => self.on_move.as_ref(),
            TouchPhase::End => self.on_end.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on_start.is_none() && self.on_move.is_none() && self.on_end.is_none()
    }
}

/// Data handed to content drawers.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeContent {
    Text(String),
    Image(ImageData),
}

/// Style and behavior of one node, as produced by the view layer.
#[derive(Clone)]
pub struct Props {
    /// Ordered fragments; later ones override earlier ones.
    pub style: Vec<Style>,
    pub pointer_events: PointerEvents,
    pub handlers: TouchHandlers,
    pub on_layout: Option<LayoutCallback>,
    /// Paint the subtree through an offscreen cache surface.
    pub cache: bool,
    /// Stable cache id; an id is derived from the node when unset.
    pub cache_id: Option<String>,
    /// Cleared while asynchronous content (e.g. an image) is still loading.
    pub content_ready: bool,
    pub content: Option<NodeContent>,
    /// Overrides the drawer registered for the node's kind.
    pub drawer: Option<ContentDrawer>,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            style: Vec::new(),
            pointer_events: PointerEvents::Auto,
            handlers: TouchHandlers::default(),
            on_layout: None,
            cache: false,
            cache_id: None,
            content_ready: true,
            content: None,
            drawer: None,
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("style", &self.style)
            .field("pointer_events", &self.pointer_events)
            .field("handlers", &!self.handlers.is_empty())
            .field("on_layout", &self.on_layout.is_some())
            .field("cache", &self.cache)
            .field("cache_id", &self.cache_id)
            .field("content_ready", &self.content_ready)
            .field("content", &self.content)
            .field("drawer", &self.drawer.is_some())
            .finish()
    }
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style.push(style);
        self
    }

    pub fn with_pointer_events(mut self, mode: PointerEvents) -> Self {
        self.pointer_events = mode;
        self
    }

    pub fn on_touch_start(mut self, f: impl Fn(&TouchEvent) -> Propagation + 'static) -> Self {
        self.handlers.on_start = Some(Rc::new(f));
        self
    }

    pub fn on_touch_move(mut self, f: impl Fn(&TouchEvent) -> Propagation + 'static) -> Self {
        self.handlers.on_move = Some(Rc::new(f));
        self
    }

    pub fn on_touch_end(mut self, f: impl Fn(&TouchEvent) -> Propagation + 'static) -> Self {
        self.handlers.on_end = Some(Rc::new(f));
        self
    }

    pub fn with_handlers(mut self, handlers: TouchHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn on_layout(mut self, f: impl Fn(Frame) + 'static) -> Self {
        self.on_layout = Some(Rc::new(f));
        self
    }

    pub fn cached(mut self, id: Option<&str>) -> Self {
        self.cache = true;
        self.cache_id = id.map(str::to_owned);
        self
    }

    pub fn with_content_ready(mut self, ready: bool) -> Self {
        self.content_ready = ready;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(NodeContent::Text(text.into()));
        self
    }

    /// Attach decoded image pixels and mark the content ready.
    pub fn with_image(mut self, image: ImageData) -> Self {
        self.content = Some(NodeContent::Image(image));
        self.content_ready = true;
        self
    }

    pub fn with_drawer(mut self, drawer: ContentDrawer) -> Self {
        self.drawer = Some(drawer);
        self
    }

    pub fn merged_style(&self) -> Style {
        Style::merged(&self.style)
    }
}

/// One element of the scene tree.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub props: Props,
    /// Root-space rectangle from the last layout pass.
    pub frame: Frame,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, props: Props) -> Self {
        Self {
            kind,
            props,
            frame: Frame::default(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn merged_style(&self) -> Style {
        self.props.merged_style()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
