use super::*;

#[test]
fn color_parse_forms() {
    assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("#ff0000").unwrap(), Color::rgb(255, 0, 0));
    assert_eq!(
        Color::parse("#00ff0080").unwrap(),
        Color::rgba(0, 255, 0, 128)
    );
    assert_eq!(Color::parse("transparent").unwrap(), Color::TRANSPARENT);
    assert!(Color::parse("red").is_err());
    assert!(Color::parse("#12345").is_err());
}

#[test]
fn color_serde_accepts_hex_and_arrays() {
    let c: Color = serde_json::from_str("\"#102030\"").unwrap();
    assert_eq!(c, Color::rgb(16, 32, 48));
    let c: Color = serde_json::from_str("[1, 2, 3, 4]").unwrap();
    assert_eq!(c, Color::rgba(1, 2, 3, 4));
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#01020304\"");
}

#[test]
fn premul_rounds() {
    assert_eq!(Color::rgba(255, 128, 0, 128).to_premul(), [128, 64, 0, 128]);
    assert_eq!(Color::WHITE.with_alpha_factor(0.5).a, 128);
}

#[test]
fn frame_contains_uses_exclusive_origin_edges() {
    let f = Frame::new(10.0, 10.0, 20.0, 20.0);
    assert!(!f.contains(Point::new(10.0, 15.0)));
    assert!(f.contains(Point::new(10.5, 15.0)));
    assert!(f.contains(Point::new(30.0, 30.0)));
    assert!(!f.contains(Point::new(30.1, 30.0)));
    assert_eq!(f.center(), Point::new(20.0, 20.0));
}

#[test]
fn image_data_validates_length() {
    assert!(ImageData::new(2, 2, vec![0; 15]).is_err());
    let img = ImageData::solid(2, 1, Color::rgb(1, 2, 3));
    assert_eq!(img.pixel(1, 0), Some([1, 2, 3, 255]));
    assert_eq!(img.pixel(2, 0), None);
}
