//! The single display-refresh tick source.
//!
//! [`Ticker`] stands in for `requestAnimationFrame`: callers register one-shot callbacks and the
//! host calls [`Ticker::tick`] once per refresh. Time comes from a pluggable [`Clock`] so tests can
//! drive animations deterministically with [`ManualClock`].

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::Rc,
    time::Instant,
};

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock, measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Handle for a callback registered with [`Ticker::request_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

type FrameCallback = Box<dyn FnOnce(f64)>;

struct Entry {
    id: u64,
    callback: FrameCallback,
}

struct TickerInner {
    clock: Box<dyn Clock>,
    /// Callbacks for the next tick.
    queued: RefCell<Vec<Entry>>,
    /// Callbacks of the tick currently running, drained front to back.
    running: RefCell<VecDeque<Entry>>,
    next_id: Cell<u64>,
    ticks: Cell<u64>,
}

/// Shared tick source. Clones drive the same queue.
#[derive(Clone)]
pub struct Ticker {
    inner: Rc<TickerInner>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("now_ms", &self.now())
            .field("pending", &self.pending())
            .field("ticks", &self.inner.ticks.get())
            .finish()
    }
}

impl Ticker {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            inner: Rc::new(TickerInner {
                clock: Box::new(clock),
                queued: RefCell::new(Vec::new()),
                running: RefCell::new(VecDeque::new()),
                next_id: Cell::new(0),
                ticks: Cell::new(0),
            }),
        }
    }

    pub fn now(&self) -> f64 {
        self.inner.clock.now_ms()
    }

    /// Run `callback` with the tick timestamp on the next [`tick`](Self::tick).
    pub fn request_frame(&self, callback: impl FnOnce(f64) + 'static) -> FrameRequest {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.queued.borrow_mut().push(Entry {
            id,
            callback: Box::new(callback),
        });
        FrameRequest(id)
    }

    /// Drop a pending callback. Returns whether it was still pending.
    pub fn cancel(&self, request: FrameRequest) -> bool {
        let mut queued = self.inner.queued.borrow_mut();
        if let Some(i) = queued.iter().position(|e| e.id == request.0) {
            queued.remove(i);
            return true;
        }
        drop(queued);
        let mut running = self.inner.running.borrow_mut();
        if let Some(i) = running.iter().position(|e| e.id == request.0) {
            running.remove(i);
            return true;
        }
        false
    }

    /// Callbacks waiting for a tick.
    pub fn pending(&self) -> usize {
        self.inner.queued.borrow().len() + self.inner.running.borrow().len()
    }

    pub fn ticks(&self) -> u64 {
        self.inner.ticks.get()
    }

    /// Run every callback registered before this call. Returns how many ran.
    ///
    /// Callbacks registered while the tick runs wait for the next one.
    pub fn tick(&self) -> usize {
        let now = self.now();
        self.inner.ticks.set(self.inner.ticks.get() + 1);
        {
            let batch = std::mem::take(&mut *self.inner.queued.borrow_mut());
            self.inner.running.borrow_mut().extend(batch);
        }
        let mut ran = 0;
        loop {
            // Borrow only long enough to pop; callbacks may cancel or request.
            let next = self.inner.running.borrow_mut().pop_front();
            let Some(entry) = next else { break };
            (entry.callback)(now);
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ticker.rs"]
mod tests;
