use std::{
    cell::RefCell,
    fmt,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::animation::{
    ease::Ease,
    ticker::{FrameRequest, Ticker},
    value::AnimatedValue,
};

/// Target, duration and curve for [`Ticker::timing`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    pub to: f64,
    pub duration_ms: f64,
    #[serde(default)]
    pub ease: Ease,
}

impl TimingConfig {
    pub fn new(to: f64, duration_ms: f64) -> Self {
        Self {
            to,
            duration_ms,
            ease: Ease::default(),
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Idle,
    Running,
    Stopped,
    Finished,
}

struct TimingState {
    value: AnimatedValue<f64>,
    ticker: Ticker,
    to: f64,
    duration_ms: f64,
    ease: Ease,
    from: f64,
    start_ms: f64,
    status: Status,
    /// Bumped on every start so callbacks from an earlier run do nothing.
    run: u64,
    request: Option<FrameRequest>,
    on_end: Option<Box<dyn FnOnce()>>,
    completion: Completion,
}

/// Drives one [`AnimatedValue`] toward a target, one step per tick.
///
/// Clones are handles to the same driver. A scheduled step keeps the driver alive, so dropping
/// every handle does not cancel a running animation; call [`stop`](Self::stop) for that.
#[derive(Clone)]
pub struct AnimatedTiming {
    state: Rc<RefCell<TimingState>>,
}

impl fmt::Debug for AnimatedTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("AnimatedTiming")
            .field("to", &s.to)
            .field("duration_ms", &s.duration_ms)
            .field("status", &s.status)
            .finish()
    }
}

impl Ticker {
    /// Build a timing driver for `value`. It does nothing until started.
    pub fn timing(&self, value: &AnimatedValue<f64>, config: TimingConfig) -> AnimatedTiming {
        let duration_ms = if config.duration_ms.is_nan() || config.duration_ms < 0.0 {
            tracing::warn!(
                duration_ms = config.duration_ms,
                "timing duration must be >= 0; clamping to 0"
            );
            0.0
        } else {
            config.duration_ms
        };
        AnimatedTiming {
            state: Rc::new(RefCell::new(TimingState {
                value: value.clone(),
                ticker: self.clone(),
                to: config.to,
                duration_ms,
                ease: config.ease,
                from: 0.0,
                start_ms: 0.0,
                status: Status::Idle,
                run: 0,
                request: None,
                on_end: None,
                completion: Completion::new(),
            })),
        }
    }
}

impl AnimatedTiming {
    /// Start from the value's current reading. Restarting mid-flight re-targets from wherever the
    /// value is now.
    pub fn start(&self) -> &Self {
        let mut s = self.state.borrow_mut();
        if let Some(req) = s.request.take() {
            s.ticker.cancel(req);
        }
        if s.completion.is_done() {
            s.completion = Completion::new();
        }
        s.from = s.value.get_value();
        s.start_ms = s.ticker.now();
        s.status = Status::Running;
        s.run += 1;
        let run = s.run;
        drop(s);
        self.schedule(run);
        self
    }

    /// Start and run `on_end` once when the duration elapses. Replaces any earlier callback.
    pub fn start_with(&self, on_end: impl FnOnce() + 'static) -> &Self {
        self.state.borrow_mut().on_end = Some(Box::new(on_end));
        self.start()
    }

    /// Cancel the scheduled step. The value keeps whatever it was last set to.
    pub fn stop(&self) -> &Self {
        let mut s = self.state.borrow_mut();
        if s.status == Status::Running {
            if let Some(req) = s.request.take() {
                s.ticker.cancel(req);
            }
            s.status = Status::Stopped;
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().status == Status::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().status == Status::Finished
    }

    /// Resolves when the current run reaches its target.
    pub fn completion(&self) -> Completion {
        self.state.borrow().completion.clone()
    }

    fn schedule(&self, run: u64) {
        let this = self.clone();
        let ticker = self.state.borrow().ticker.clone();
        let req = ticker.request_frame(move |now| this.step(run, now));
        self.state.borrow_mut().request = Some(req);
    }

    fn step(&self, run: u64, now: f64) {
        let (value, next, done) = {
            let mut s = self.state.borrow_mut();
            if s.run != run || s.status != Status::Running {
                return;
            }
            s.request = None;
            let t = if s.duration_ms <= 0.0 {
                1.0
            } else {
                ((now - s.start_ms) / s.duration_ms).clamp(0.0, 1.0)
            };
            if t >= 1.0 {
                s.status = Status::Finished;
                (s.value.clone(), s.to, true)
            } else {
                let v = s.from + s.ease.apply(t) * (s.to - s.from);
                (s.value.clone(), v, false)
            }
        };

        // The observer may restart or stop this timing; state borrows are released here.
        value.set_value(next);

        if done {
            let (on_end, completion) = {
                let mut s = self.state.borrow_mut();
                (s.on_end.take(), s.completion.clone())
            };
            completion.resolve();
            if let Some(f) = on_end {
                f();
            }
            return;
        }

        let still_ours = {
            let s = self.state.borrow();
            s.run == run && s.status == Status::Running
        };
        if still_ours {
            self.schedule(run);
        }
    }
}

#[derive(Default)]
struct CompletionState {
    done: bool,
    wakers: Vec<Waker>,
}

/// One-shot completion signal for an [`AnimatedTiming`] run.
///
/// Polling it as a `Future` parks until the run finishes; `is_done` checks without waiting.
#[derive(Clone, Default)]
pub struct Completion {
    state: Rc<RefCell<CompletionState>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("done", &self.is_done())
            .finish()
    }
}

impl Completion {
    fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    fn resolve(&self) {
        let wakers = {
            let mut s = self.state.borrow_mut();
            if s.done {
                return;
            }
            s.done = true;
            std::mem::take(&mut s.wakers)
        };
        for w in wakers {
            w.wake();
        }
    }
}

impl Future for Completion {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut s = self.state.borrow_mut();
        if s.done {
            return Poll::Ready(());
        }
        if !s.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            s.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timing.rs"]
mod tests;
