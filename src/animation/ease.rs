use std::f64::consts::PI;

/// Easing functions mapping normalized progress `t` in `[0, 1]` to eased progress.
///
/// `In`/`Out`/`InOut` wrap an inner curve: `In(e)` runs it forwards, `Out(e)` mirrors it, and
/// `InOut(e)` runs it forwards for the first half and mirrored for the second.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    /// Standard `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,
    Bezier(f64, f64, f64, f64),
    Quad,
    Cubic,
    Sin,
    Circle,
    Exp,
    /// Overshooting curve; the parameter is the overshoot (1.70158 is the common choice).
    Back(f64),
    /// Four-segment piecewise quadratic.
    Bounce,
    /// Damped cosine. `bounciness` 1 gives a single overshoot.
    Elastic(f64),
    In(Box<Ease>),
    Out(Box<Ease>),
    InOut(Box<Ease>),
}

impl Ease {
    pub fn ease_in(inner: Ease) -> Self {
        Self::In(Box::new(inner))
    }

    pub fn ease_out(inner: Ease) -> Self {
        Self::Out(Box::new(inner))
    }

    pub fn ease_in_out(inner: Ease) -> Self {
        Self::InOut(Box::new(inner))
    }

    /// Apply the curve to `t`, clamped to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t == 0.0 {
            return 0.0;
        }
        if t == 1.0 {
            return 1.0;
        }
        self.raw(t)
    }

    fn raw(&self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::Bezier(x1, y1, x2, y2) => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Sin => 1.0 - (t * PI / 2.0).cos(),
            Self::Circle => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Exp => 2f64.powf(10.0 * (t - 1.0)),
            Self::Back(s) => t * t * ((s + 1.0) * t - s),
            Self::Bounce => bounce(t),
            Self::Elastic(bounciness) => {
                let p = bounciness * PI;
                1.0 - (t * PI / 2.0).cos().powi(3) * (t * p).cos()
            }
            Self::In(inner) => inner.apply(t),
            Self::Out(inner) => 1.0 - inner.apply(1.0 - t),
            Self::InOut(inner) => {
                if t < 0.5 {
                    inner.apply(t * 2.0) / 2.0
                } else {
                    1.0 - inner.apply((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }
}

fn bounce(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

/// Solve a CSS-style cubic bezier for `y` at horizontal position `x`.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    // Linear shortcut; the general path would converge to the same thing.
    if x1 == y1 && x2 == y2 {
        return x;
    }
    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);

    let sample = |a1: f64, a2: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    };
    let slope = |a1: f64, a2: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    };

    let mut s = x;
    for _ in 0..8 {
        let err = sample(x1, x2, s) - x;
        if err.abs() < 1e-7 {
            return sample(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    // Newton stalled: bisect.
    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..64 {
        let v = sample(x1, x2, s);
        if (v - x).abs() < 1e-7 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample(y1, y2, s)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
