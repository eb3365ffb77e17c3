use super::*;

#[test]
fn tiny_blur_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(blur_premul(&src, 1, 2, 0.0).unwrap(), src);
    assert_eq!(blur_premul(&src, 1, 2, 0.5).unwrap(), src);
}

#[test]
fn length_mismatch_is_an_error() {
    let err = blur_premul(&[0u8; 7], 1, 2, 4.0).unwrap_err();
    assert!(matches!(err, SceneryError::Surface(_)));
}

#[test]
fn single_pixel_spreads_and_conserves_alpha() {
    let (w, h) = (15u32, 15u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((7 * w + 7) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_premul(&src, w, h, 3.0).unwrap();
    assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
    let sum_a: i32 = out.chunks_exact(4).map(|px| i32::from(px[3])).sum();
    assert!((sum_a - 255).abs() <= 16, "alpha sum {sum_a}");
}

#[test]
fn edges_fade_to_transparent() {
    let (w, h) = (9u32, 9u32);
    let src = [0u8, 0, 0, 255].repeat((w * h) as usize);
    let out = blur_premul(&src, w, h, 4.0).unwrap();
    let corner = out[3];
    let middle = out[((4 * w + 4) * 4 + 3) as usize];
    assert!(corner < middle);
}

#[test]
fn extent_grows_with_blur() {
    assert_eq!(blur_extent(0.0), 0.0);
    assert_eq!(blur_extent(-2.0), 0.0);
    assert_eq!(blur_extent(4.0), 6.0);
}
