use std::{cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

use crate::foundation::error::{SceneryError, SceneryResult};

/// Repaint callback registered by whoever last read an animated value for painting.
pub type Observer = Rc<dyn Fn()>;

type Derive<T> = Rc<dyn Fn(Option<&Observer>) -> T>;

enum Source<T> {
    Stored(T),
    Derived(Derive<T>),
}

struct Inner<T> {
    source: Source<T>,
    observer: Option<Observer>,
}

/// Shared, single-threaded animated scalar.
///
/// Cloning yields another handle to the same value. Reads through [`AnimatedValue::observe`]
/// install a single observer slot; the last reader wins and earlier observers are dropped.
/// `set_value` notifies the current observer, if any.
pub struct AnimatedValue<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for AnimatedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for AnimatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedValue")
            .field("value", &self.get_value())
            .field("derived", &self.is_derived())
            .field("observed", &self.has_observer())
            .finish()
    }
}

impl<T: Clone + 'static> AnimatedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                source: Source::Stored(value),
                observer: None,
            })),
        }
    }

    fn derived(f: Derive<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                source: Source::Derived(f),
                observer: None,
            })),
        }
    }

    /// Replace the value and notify the observer.
    ///
    /// A derived value stops following its source and becomes a plain stored value.
    pub fn set_value(&self, value: T) {
        let observer = {
            let mut inner = self.inner.borrow_mut();
            inner.source = Source::Stored(value);
            inner.observer.clone()
        };
        if let Some(observer) = observer {
            observer();
        }
    }

    /// Current value without touching the observer slot.
    pub fn get_value(&self) -> T {
        self.read(None)
    }

    /// Current value, registering `observer` as the single active observer.
    ///
    /// For derived values the observer lands on the underlying source, since that is where
    /// changes originate.
    pub fn observe(&self, observer: &Observer) -> T {
        self.read(Some(observer))
    }

    fn read(&self, observer: Option<&Observer>) -> T {
        let derive = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match &inner.source {
                Source::Stored(v) => {
                    if let Some(o) = observer {
                        inner.observer = Some(Rc::clone(o));
                    }
                    return v.clone();
                }
                Source::Derived(f) => Rc::clone(f),
            }
        };
        derive(observer)
    }

    pub fn clear_observer(&self) {
        self.inner.borrow_mut().observer = None;
    }

    pub fn has_observer(&self) -> bool {
        self.inner.borrow().observer.is_some()
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.inner.borrow().source, Source::Derived(_))
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Derived value computed from this one on every read.
    pub fn map<U, F>(&self, f: F) -> AnimatedValue<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let src = self.clone();
        AnimatedValue::derived(Rc::new(move |observer: Option<&Observer>| {
            f(src.read(observer))
        }))
    }
}

impl AnimatedValue<f64> {
    /// Piecewise-linear mapping of this value through `input` -> `output` breakpoints.
    pub fn interpolate(&self, input: &[f64], output: &[f64]) -> SceneryResult<AnimatedValue<f64>> {
        let interp = Interpolation::new(input, output)?;
        Ok(self.map(move |x| interp.map(x)))
    }
}

/// Validated breakpoint table for [`AnimatedValue::interpolate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolation {
    input: SmallVec<[f64; 4]>,
    output: SmallVec<[f64; 4]>,
}

impl Interpolation {
    pub fn new(input: &[f64], output: &[f64]) -> SceneryResult<Self> {
        if input.is_empty() {
            return Err(SceneryError::invalid_range("input range is empty"));
        }
        if input.len() != output.len() {
            return Err(SceneryError::invalid_range(format!(
                "input has {} breakpoints, output has {}",
                input.len(),
                output.len()
            )));
        }
        if let Some(bad) = input.iter().chain(output).find(|v| !v.is_finite()) {
            return Err(SceneryError::invalid_range(format!(
                "non-finite breakpoint {bad}"
            )));
        }
        if let Some(i) = input.windows(2).position(|w| w[1] < w[0]) {
            return Err(SceneryError::invalid_range(format!(
                "input range must be non-decreasing (index {} = {} < {})",
                i + 1,
                input[i + 1],
                input[i]
            )));
        }
        Ok(Self {
            input: SmallVec::from_slice(input),
            output: SmallVec::from_slice(output),
        })
    }

    /// Map `x`, clamping to the first/last output outside the input range.
    pub fn map(&self, x: f64) -> f64 {
        let first = self.input[0];
        let last = self.input[self.input.len() - 1];
        if x.is_nan() || x <= first {
            return self.output[0];
        }
        if x >= last {
            return self.output[self.output.len() - 1];
        }
        // First breakpoint strictly above x; x is in (first, last) so 1 <= hi < len.
        let hi = self.input.partition_point(|&b| b <= x);
        let lo = hi - 1;
        let (x0, x1) = (self.input[lo], self.input[hi]);
        let (y0, y1) = (self.output[lo], self.output[hi]);
        y0 + (x - x0) / (x1 - x0) * (y1 - y0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
