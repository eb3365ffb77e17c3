use std::{cell::Cell, rc::Rc};

use serde_json::json;

use super::*;

#[test]
fn json_dispatch_covers_layout_and_paint_keys() {
    let s = Style::from_json(&json!({
        "width": 100,
        "height": "50%",
        "minWidth": "auto",
        "flex": 1,
        "justifyContent": "space-between",
        "alignItems": "center",
        "flexDirection": "row",
        "position": "absolute",
        "left": 10,
        "paddingTop": 4,
        "margin": "5%",
        "borderWidth": 2,
        "opacity": 0.5,
        "translateX": 3,
        "zIndex": 2,
        "overflow": "hidden",
        "backgroundColor": "#ff0000",
        "borderColor": [0, 0, 255, 255],
        "borderRadius": 8,
        "shadowColor": "#000",
        "path": true
    }))
    .unwrap();

    assert_eq!(s.width, Some(Dimension::Points(100.0)));
    assert_eq!(s.height, Some(Dimension::Percent(50.0)));
    assert_eq!(s.min_width, Some(Dimension::Auto));
    assert_eq!(s.justify_content, Some(JustifyContent::SpaceBetween));
    assert_eq!(s.align_items, Some(Align::Center));
    assert_eq!(s.flex_direction, Some(FlexDirection::Row));
    assert_eq!(s.position, Some(PositionType::Absolute));
    assert_eq!(s.inset.left, Some(Dimension::Points(10.0)));
    assert_eq!(s.padding.top, Some(Dimension::Points(4.0)));
    assert_eq!(s.margin.all, Some(Dimension::Percent(5.0)));

    let r = s.resolve(None);
    assert_eq!(r.opacity, 0.5);
    assert_eq!(r.translate_x, 3.0);
    assert_eq!(r.z_index, 2.0);
    assert!(r.clips());
    assert_eq!(r.background_color, Color::rgb(255, 0, 0));
    assert_eq!(r.border_color, Some(Color::rgb(0, 0, 255)));
    assert_eq!(r.border_width, 2.0);
    assert_eq!(r.radii, [8.0; 4]);
    assert_eq!(r.shadow.map(|s| s.color), Some(Color::BLACK));
    assert!(r.path);
}

#[test]
fn unknown_keys_are_ignored_and_bad_values_fail() {
    let mut s = Style::new();
    s.set_json("fontFamily", &json!("serif")).unwrap();

    for (key, value) in [
        ("width", json!("wide")),
        ("width", json!(true)),
        ("justifyContent", json!("middle")),
        ("opacity", json!("half")),
        ("backgroundColor", json!("#zzzzzz")),
        ("path", json!(1)),
    ] {
        let err = s.set_json(key, &value).unwrap_err();
        assert!(
            matches!(&err, SceneryError::StyleValue { key: k, .. } if k == key),
            "{err}"
        );
    }
    assert!(s.width.is_none());
}

#[test]
fn lossy_parse_keeps_good_properties() {
    let s = Style::from_json_lossy(&json!({"width": "nope", "height": 20, "opacity": 0.3}));
    assert!(s.width.is_none());
    assert_eq!(s.height, Some(Dimension::Points(20.0)));
    assert!(Style::from_json(&json!({"width": "nope"})).is_err());
    assert!(Style::from_json(&json!([1, 2])).is_err());
}

#[test]
fn merge_is_shallow_later_wins() {
    let a = Style::from_json(&json!({"width": 10, "opacity": 0.2, "paddingLeft": 1, "padding": 3}))
        .unwrap();
    let b = Style::from_json(&json!({"width": 20, "paddingLeft": 2})).unwrap();
    let m = Style::merged([&a, &b]);
    assert_eq!(m.width, Some(Dimension::Points(20.0)));
    assert_eq!(m.padding.left, Some(Dimension::Points(2.0)));
    assert_eq!(m.padding.all, Some(Dimension::Points(3.0)));
    assert_eq!(m.resolve(None).opacity, 0.2);
}

#[test]
fn defaults_and_scale_fallback() {
    let r = Style::default().resolve(None);
    assert_eq!(r.opacity, 1.0);
    assert!(!r.needs_save());
    assert!(!r.needs_path());
    assert_eq!(r.scale(), (1.0, 1.0));

    let s = Style::from_json(&json!({"scale": 2, "scaleY": 3})).unwrap();
    let r = s.resolve(None);
    assert_eq!(r.scale(), (2.0, 3.0));
    assert!(r.needs_save());
}

#[test]
fn corner_radii_override_uniform_radius() {
    let s = Style::from_json(&json!({"borderRadius": 4, "borderBottomLeftRadius": 9})).unwrap();
    assert_eq!(s.resolve(None).radii, [4.0, 4.0, 4.0, 9.0]);
}

#[test]
fn overflow_aliases() {
    for kw in ["hidden", "clip", "scroll"] {
        let s = Style::from_json(&json!({"overflow": kw})).unwrap();
        assert_eq!(s.overflow, Some(Overflow::Hidden));
    }
    let s = Style::from_json(&json!({"overflow": "visible"})).unwrap();
    assert_eq!(s.overflow, Some(Overflow::Visible));
}

#[test]
fn resolve_observes_animated_fields() {
    let opacity = AnimatedValue::new(0.5);
    let s = Style {
        opacity: Some((&opacity).into()),
        ..Style::default()
    };
    assert!(s.has_animated());

    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let obs: Observer = Rc::new(move || h.set(h.get() + 1));

    assert_eq!(s.resolve(Some(&obs)).opacity, 0.5);
    opacity.set_value(0.75);
    assert_eq!(hits.get(), 1);
    assert_eq!(s.resolve(None).opacity, 0.75);

    s.release_observers();
    assert!(!opacity.has_observer());
    opacity.set_value(1.0);
    assert_eq!(hits.get(), 1);
}

#[test]
fn border_needs_color_and_width() {
    let s = Style::from_json(&json!({"borderWidth": 1})).unwrap();
    assert!(!s.resolve(None).has_border());
    let s = Style::from_json(&json!({"borderWidth": 1, "borderColor": "#123"})).unwrap();
    assert!(s.resolve(None).has_border());
    assert!(s.resolve(None).needs_path());
}
