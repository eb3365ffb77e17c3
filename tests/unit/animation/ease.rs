use super::*;

fn all() -> Vec<Ease> {
    vec![
        Ease::Linear,
        Ease::Ease,
        Ease::Bezier(0.42, 0.0, 0.58, 1.0),
        Ease::Quad,
        Ease::Cubic,
        Ease::Sin,
        Ease::Circle,
        Ease::Exp,
        Ease::Back(1.70158),
        Ease::Bounce,
        Ease::Elastic(1.0),
        Ease::ease_in(Ease::Quad),
        Ease::ease_out(Ease::Cubic),
        Ease::ease_in_out(Ease::Sin),
    ]
}

#[test]
fn endpoints_are_stable() {
    for ease in all() {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
        assert_eq!(ease.apply(-3.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(7.0), 1.0, "{ease:?}");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in [
        Ease::Linear,
        Ease::Ease,
        Ease::Quad,
        Ease::Cubic,
        Ease::Sin,
        Ease::Circle,
        Ease::ease_out(Ease::Quad),
        Ease::ease_in_out(Ease::Cubic),
    ] {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn wrappers_compose() {
    let t = 0.3;
    assert!((Ease::ease_in(Ease::Quad).apply(t) - t * t).abs() < 1e-12);
    assert!((Ease::ease_out(Ease::Quad).apply(t) - (1.0 - 0.7 * 0.7)).abs() < 1e-12);
    let io = Ease::ease_in_out(Ease::Quad);
    assert!((io.apply(0.25) - 0.125).abs() < 1e-12);
    assert!((io.apply(0.5) - 0.5).abs() < 1e-12);
    assert!((io.apply(0.75) - 0.875).abs() < 1e-12);
}

#[test]
fn standard_ease_matches_css_reference_points() {
    // cubic-bezier(0.25, 0.1, 0.25, 1) is well above linear at the midpoint.
    let mid = Ease::Ease.apply(0.5);
    assert!((mid - 0.8024).abs() < 1e-3, "{mid}");
}

#[test]
fn bounce_segments_join() {
    let b = Ease::Bounce;
    assert!((b.apply(1.0 / 2.75) - 1.0).abs() < 1e-9);
    assert!((b.apply(2.0 / 2.75) - 1.0).abs() < 1e-9);
    assert!(b.apply(0.5) < 1.0);
}

#[test]
fn elastic_overshoots() {
    let e = Ease::Elastic(2.0);
    let max = (1..100)
        .map(|i| e.apply(f64::from(i) / 100.0))
        .fold(f64::MIN, f64::max);
    assert!(max > 1.0);
}

#[test]
fn default_is_standard_ease() {
    assert_eq!(Ease::default(), Ease::Ease);
}
