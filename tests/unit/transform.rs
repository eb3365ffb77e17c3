use super::*;

fn approx(a: [f64; 6], b: [f64; 6]) {
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
    }
}

#[test]
fn translate_accumulates_in_local_space() {
    let mut t = Transform::new();
    t.scale(2.0, 2.0);
    t.translate(5.0, 1.0);
    approx(t.coeffs(), [2.0, 0.0, 0.0, 2.0, 10.0, 2.0]);
}

#[test]
fn rotate_matches_canvas_coefficients() {
    let mut t = Transform::new();
    t.rotate(std::f64::consts::FRAC_PI_2);
    let [a, b, c, d, _, _] = t.coeffs();
    assert!(a.abs() < 1e-12);
    assert!((b - 1.0).abs() < 1e-12);
    assert!((c + 1.0).abs() < 1e-12);
    assert!(d.abs() < 1e-12);
    let p = t.transform_point(Point::new(1.0, 0.0));
    assert!((p.x).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
}

#[test]
fn save_restore_is_a_stack() {
    let mut t = Transform::new();
    t.save();
    t.translate(3.0, 4.0);
    t.save();
    t.scale(2.0, 2.0);
    assert_eq!(t.depth(), 2);
    t.restore();
    approx(t.coeffs(), [1.0, 0.0, 0.0, 1.0, 3.0, 4.0]);
    t.restore();
    approx(t.coeffs(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    // Unbalanced restore keeps the current matrix.
    t.translate(1.0, 1.0);
    t.restore();
    approx(t.coeffs(), [1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn center_pivot_scale() {
    let mut t = Transform::new();
    t.translate(50.0, 50.0);
    t.scale(2.0, 2.0);
    t.translate(-50.0, -50.0);
    let p = t.transform_point(Point::new(50.0, 50.0));
    assert_eq!(p, Point::new(50.0, 50.0));
    let q = t.transform_point(Point::new(60.0, 50.0));
    assert!((q.x - 70.0).abs() < 1e-12);
}
