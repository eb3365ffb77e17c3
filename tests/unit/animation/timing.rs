use std::{
    cell::Cell,
    sync::Arc,
    task::{Wake, Waker},
};

use super::*;
use crate::animation::ticker::ManualClock;

fn manual() -> (ManualClock, Ticker) {
    let clock = ManualClock::new(1000.0);
    (clock.clone(), Ticker::new(clock))
}

struct Flag(std::sync::atomic::AtomicBool);

impl Wake for Flag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[test]
fn reaches_target_exactly_and_completes_once() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(0.0);
    let ends = Rc::new(Cell::new(0));
    let e = Rc::clone(&ends);
    let timing = ticker.timing(&v, TimingConfig::new(10.0, 100.0).with_ease(Ease::Linear));
    timing.start_with(move || e.set(e.get() + 1));
    assert!(timing.is_running());

    clock.advance(50.0);
    ticker.tick();
    assert_eq!(v.get_value(), 5.0);
    assert_eq!(ends.get(), 0);

    clock.advance(50.0);
    ticker.tick();
    assert_eq!(v.get_value(), 10.0);
    assert_eq!(ends.get(), 1);
    assert!(timing.is_finished());
    assert!(timing.completion().is_done());

    clock.advance(50.0);
    ticker.tick();
    assert_eq!(ends.get(), 1);
    assert_eq!(ticker.pending(), 0);
}

#[test]
fn overshooting_tick_still_lands_on_target() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(3.0);
    ticker
        .timing(&v, TimingConfig::new(0.1 + 0.2, 100.0))
        .start();
    clock.advance(250.0);
    ticker.tick();
    assert_eq!(v.get_value(), 0.1 + 0.2);
}

#[test]
fn zero_and_negative_durations_finish_next_tick() {
    let (_clock, ticker) = manual();
    for d in [0.0, -5.0, f64::NAN] {
        let v = AnimatedValue::new(0.0);
        let t = ticker.timing(&v, TimingConfig::new(7.0, d));
        t.start();
        assert_eq!(v.get_value(), 0.0);
        ticker.tick();
        assert_eq!(v.get_value(), 7.0);
        assert!(t.is_finished());
    }
}

#[test]
fn stop_is_idempotent_and_keeps_value() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(0.0);
    let t = ticker.timing(&v, TimingConfig::new(100.0, 100.0).with_ease(Ease::Linear));
    t.start();
    clock.advance(25.0);
    ticker.tick();
    t.stop().stop();
    assert!(!t.is_running());
    assert_eq!(v.get_value(), 25.0);
    clock.advance(100.0);
    ticker.tick();
    assert_eq!(v.get_value(), 25.0);
    assert!(!t.completion().is_done());
}

#[test]
fn restart_retargets_from_current_value() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(0.0);
    let t = ticker.timing(&v, TimingConfig::new(100.0, 100.0).with_ease(Ease::Linear));
    t.start();
    clock.advance(50.0);
    ticker.tick();
    assert_eq!(v.get_value(), 50.0);

    t.start();
    assert_eq!(ticker.pending(), 1);
    clock.advance(50.0);
    ticker.tick();
    assert_eq!(v.get_value(), 75.0);
}

#[test]
fn observer_sees_every_step() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(0.0);
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let obs: crate::animation::value::Observer = Rc::new(move || h.set(h.get() + 1));
    v.observe(&obs);
    ticker.timing(&v, TimingConfig::new(1.0, 32.0)).start();
    for _ in 0..3 {
        clock.advance(16.0);
        ticker.tick();
    }
    assert_eq!(hits.get(), 2);
    assert_eq!(v.get_value(), 1.0);
}

#[test]
fn completion_future_wakes() {
    let (clock, ticker) = manual();
    let v = AnimatedValue::new(0.0);
    let t = ticker.timing(&v, TimingConfig::new(1.0, 10.0));
    t.start();
    let mut fut = t.completion();

    let flag = Arc::new(Flag(std::sync::atomic::AtomicBool::new(false)));
    let waker = Waker::from(Arc::clone(&flag));
    let mut cx = Context::from_waker(&waker);
    assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());

    clock.advance(10.0);
    ticker.tick();
    assert!(flag.0.load(std::sync::atomic::Ordering::SeqCst));
    assert!(Pin::new(&mut fut).poll(&mut cx).is_ready());
}

#[test]
fn config_deserializes_with_default_ease() {
    let cfg: TimingConfig = serde_json::from_str(r#"{"to": 3, "durationMs": 250}"#).unwrap();
    assert_eq!(cfg, TimingConfig::new(3.0, 250.0));
}
