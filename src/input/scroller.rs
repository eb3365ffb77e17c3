//! Single-axis drag scrolling with momentum.
//!
//! A [`Scroller`] follows one touch at a time. While dragging, the finger delta moves the offset
//! one-to-one and the last delta/time sample becomes the velocity. On release the velocity decays
//! each tick as `v' = v - dt * friction * v` until it drops under the configured minimum or the
//! offset hits a bound. With paging enabled the release instead glides to the page boundary
//! nearest to where free momentum would have come to rest.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    animation::ticker::{FrameRequest, Ticker},
    foundation::config::ScrollConfig,
    input::touch::{Touch, TouchEvent},
    scene::node::{Propagation, TouchHandlers},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

impl Axis {
    fn pick(self, touch: &Touch) -> f64 {
        match self {
            Self::Horizontal => touch.x,
            Self::Vertical => touch.y,
        }
    }
}

/// Emitted whenever the offset changes. Only the scrolling axis is ever non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollEvent {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub timestamp: f64,
}

pub type ScrollListener = Rc<dyn Fn(&ScrollEvent)>;

struct Drag {
    touch: u64,
    last_pos: f64,
    last_ts: f64,
}

struct ScrollState {
    axis: Axis,
    config: ScrollConfig,
    ticker: Ticker,
    listener: ScrollListener,
    offset: f64,
    max: f64,
    /// Pixels per millisecond, positive toward larger offsets.
    velocity: f64,
    drag: Option<Drag>,
    momentum: Option<FrameRequest>,
    last_step: f64,
    snap_to: Option<f64>,
}

/// Shared scroll-physics handle. Clones drive the same state.
#[derive(Clone)]
pub struct Scroller {
    state: Rc<RefCell<ScrollState>>,
}

impl fmt::Debug for Scroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("Scroller")
            .field("axis", &s.axis)
            .field("offset", &s.offset)
            .field("max", &s.max)
            .field("velocity", &s.velocity)
            .field("dragging", &s.drag.is_some())
            .field("decelerating", &s.momentum.is_some())
            .finish()
    }
}

impl Scroller {
    pub fn new(
        axis: Axis,
        config: ScrollConfig,
        ticker: Ticker,
        listener: impl Fn(&ScrollEvent) + 'static,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScrollState {
                axis,
                config,
                ticker,
                listener: Rc::new(listener),
                offset: 0.0,
                max: 0.0,
                velocity: 0.0,
                drag: None,
                momentum: None,
                last_step: 0.0,
                snap_to: None,
            })),
        }
    }

    /// Set the scrollable range to `content - viewport`. Content that fits pins the offset at 0.
    pub fn set_extents(&self, content: f64, viewport: f64) {
        let max = content - viewport;
        let max = if max.is_finite() && max > 0.0 { max } else { 0.0 };
        let now = {
            let mut s = self.state.borrow_mut();
            s.max = max;
            s.ticker.now()
        };
        let current = self.offset();
        self.apply(current.clamp(0.0, max), now);
    }

    pub fn offset(&self) -> f64 {
        self.state.borrow().offset
    }

    pub fn max_offset(&self) -> f64 {
        self.state.borrow().max
    }

    pub fn velocity(&self) -> f64 {
        self.state.borrow().velocity
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().drag.is_some()
    }

    pub fn is_decelerating(&self) -> bool {
        self.state.borrow().momentum.is_some()
    }

    /// Begin tracking the lowest-id touch of `event`. Ignored while another touch is tracked.
    pub fn touch_start(&self, event: &TouchEvent) {
        let Some(touch) = event.first() else {
            return;
        };
        let mut s = self.state.borrow_mut();
        if s.drag.is_some() {
            return;
        }
        s.cancel_momentum();
        s.velocity = 0.0;
        let last_pos = s.axis.pick(touch);
        s.drag = Some(Drag {
            touch: touch.id,
            last_pos,
            last_ts: event.timestamp,
        });
    }

    pub fn touch_move(&self, event: &TouchEvent) {
        let (target, ts) = {
            let mut s = self.state.borrow_mut();
            let axis = s.axis;
            let Some(drag) = s.drag.as_mut() else {
                return;
            };
            let Some(touch) = event.get(drag.touch) else {
                return;
            };
            let pos = axis.pick(touch);
            let delta = drag.last_pos - pos;
            let dt = event.timestamp - drag.last_ts;
            drag.last_pos = pos;
            drag.last_ts = event.timestamp;
            if dt > 0.0 {
                s.velocity = delta / dt;
            }
            (s.offset + delta, event.timestamp)
        };
        self.change_to(target, ts);
    }

    /// Release the tracked touch and start momentum from the last velocity sample.
    pub fn touch_end(&self, event: &TouchEvent) {
        {
            let mut s = self.state.borrow_mut();
            let Some(drag) = &s.drag else {
                return;
            };
            if !event.touches.is_empty() && event.get(drag.touch).is_none() {
                return;
            }
            s.drag = None;
            s.last_step = s.ticker.now();
            let snap = s.config.paging.map(|page| s.page_target(page));
            s.snap_to = snap;
        }
        self.schedule_momentum();
    }

    /// Handlers that feed a node's touches into this scroller and let them keep bubbling.
    pub fn touch_handlers(&self) -> TouchHandlers {
        let (a, b, c) = (self.clone(), self.clone(), self.clone());
        TouchHandlers {
            on_start: Some(Rc::new(move |e: &TouchEvent| {
                a.touch_start(e);
                Propagation::Continue
            })),
            on_move: Some(Rc::new(move |e: &TouchEvent| {
                b.touch_move(e);
                Propagation::Continue
            })),
            on_end: Some(Rc::new(move |e: &TouchEvent| {
                c.touch_end(e);
                Propagation::Continue
            })),
        }
    }

    /// Move by `delta`, clamped to the range. Stops any momentum.
    pub fn scroll_by(&self, delta: f64) {
        let (target, now) = {
            let mut s = self.state.borrow_mut();
            s.cancel_momentum();
            (s.offset + delta, s.ticker.now())
        };
        self.change_to(target, now);
    }

    /// Jump to `offset`, clamped to the range. Stops any momentum.
    pub fn scroll_to(&self, offset: f64) {
        let now = {
            let mut s = self.state.borrow_mut();
            s.cancel_momentum();
            s.ticker.now()
        };
        self.change_to(offset, now);
    }

    /// Clamp and apply. A release that cannot move any further loses its velocity.
    fn change_to(&self, target: f64, timestamp: f64) {
        if target.is_nan() {
            return;
        }
        let max = self.max_offset();
        if !self.apply(target.clamp(0.0, max), timestamp) {
            let mut s = self.state.borrow_mut();
            if s.drag.is_none() {
                s.velocity = 0.0;
            }
        }
    }

    /// Store `offset` and notify the listener. Returns whether the offset changed.
    fn apply(&self, offset: f64, timestamp: f64) -> bool {
        let (listener, event) = {
            let mut s = self.state.borrow_mut();
            if offset == s.offset {
                return false;
            }
            s.offset = offset;
            (Rc::clone(&s.listener), s.event(timestamp))
        };
        listener(&event);
        true
    }

    fn schedule_momentum(&self) {
        let this = self.clone();
        let mut s = self.state.borrow_mut();
        let running = s.velocity.abs() > s.config.min_velocity || s.snap_to.is_some();
        if !running {
            s.velocity = 0.0;
            return;
        }
        let req = s.ticker.request_frame(move |now| this.momentum_step(now));
        s.momentum = Some(req);
    }

    fn momentum_step(&self, now: f64) {
        let target = {
            let mut s = self.state.borrow_mut();
            s.momentum = None;
            if s.drag.is_some() {
                return;
            }
            let dt = (now - s.last_step).max(0.0);
            s.last_step = now;
            match s.snap_to {
                Some(dest) => s.snap_step(dest, dt),
                None => {
                    let decay = (1.0 - dt * s.config.friction).max(0.0);
                    s.velocity *= decay;
                    s.offset + s.velocity * dt
                }
            }
        };
        self.change_to(target, now);

        let mut s = self.state.borrow_mut();
        if let Some(dest) = s.snap_to
            && s.offset == dest
        {
            s.snap_to = None;
            s.velocity = 0.0;
        }
        if s.snap_to.is_some() && s.velocity == 0.0 {
            // Blocked by a bound short of the page edge.
            s.snap_to = None;
        }
        drop(s);
        self.schedule_momentum();
    }
}

impl ScrollState {
    fn cancel_momentum(&mut self) {
        if let Some(req) = self.momentum.take() {
            self.ticker.cancel(req);
        }
        self.snap_to = None;
    }

    fn event(&self, timestamp: f64) -> ScrollEvent {
        match self.axis {
            Axis::Vertical => ScrollEvent {
                x: 0.0,
                y: self.offset,
                vx: 0.0,
                vy: self.velocity,
                timestamp,
            },
            Axis::Horizontal => ScrollEvent {
                x: self.offset,
                y: 0.0,
                vx: self.velocity,
                vy: 0.0,
                timestamp,
            },
        }
    }

    /// Page edge nearest to where free momentum would settle (`offset + v / friction`).
    fn page_target(&self, page: f64) -> f64 {
        let rest = self.offset + self.velocity / self.config.friction;
        ((rest / page).round() * page).clamp(0.0, self.max)
    }

    /// Decay as usual but never below the minimum speed, heading for `dest` without overshoot.
    fn snap_step(&mut self, dest: f64, dt: f64) -> f64 {
        let remaining = dest - self.offset;
        let decay = (1.0 - dt * self.config.friction).max(0.0);
        let speed = (self.velocity.abs() * decay).max(self.config.min_velocity.max(f64::EPSILON));
        self.velocity = speed.copysign(remaining);
        let step = self.velocity * dt;
        if step.abs() >= remaining.abs() {
            dest
        } else {
            self.offset + step
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/scroller.rs"]
mod tests;
