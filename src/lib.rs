//! Scenery is a retained-mode 2D scene-graph engine.
//!
//! A view layer builds and mutates a styled node tree through the [`Engine`] host methods; the
//! engine lays the tree out with a flex solver, paints it back to front onto a raster surface
//! (transforms, rounded clips, shadows, offscreen caching of marked subtrees), routes touches to
//! the node under the finger and drives animated values from a single tick source.
//!
//! - Build nodes with [`Props`] and [`Style`], attach them under [`Engine::root`]
//! - Call [`Engine::reset_after_commit`] after each batch of mutations
//! - Call [`Engine::tick`] once per display refresh and [`Engine::handle_touch`] for input
#![forbid(unsafe_code)]

mod foundation;

/// Animated values, easing and the tick-driven timing scheduler.
pub mod animation;
/// Root container and view-layer host boundary.
pub mod engine;
/// Hit-testing, touch routing and scroll physics.
pub mod input;
/// Flex layout through an external solver.
pub mod layout;
/// Surfaces, the offscreen cache and the paint pass.
pub mod render;
/// Node tree, props and styles.
pub mod scene;
/// Affine transform stack.
pub mod transform;

pub use crate::foundation::config::{EngineConfig, ScrollConfig};
pub use crate::foundation::core::{Affine, BezPath, Color, Frame, ImageData, Point, Rect, Vec2};
pub use crate::foundation::error::{SceneryError, SceneryResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::ticker::{Clock, ManualClock, SystemClock, Ticker};
pub use crate::animation::timing::{AnimatedTiming, TimingConfig};
pub use crate::animation::value::{AnimatedValue, Observer};
pub use crate::engine::{Engine, EngineStats};
pub use crate::input::scroller::{Axis, ScrollEvent, Scroller};
pub use crate::input::touch::{DispatchOutcome, Touch, TouchEvent, TouchPhase, TouchRouter};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::paint::{ContentDrawer, DrawerRegistry};
pub use crate::render::recording::{DrawCommand, RecordingSurface};
pub use crate::render::surface::{Canvas, FillStyle, Surface};
pub use crate::scene::node::{NodeId, NodeKind, PointerEvents, Propagation, Props};
pub use crate::scene::style::Style;
pub use crate::transform::Transform;
