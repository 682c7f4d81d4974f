use std::io::Cursor;

use pixelparade::{
    AnimParams, DrawSurface, FrameTransform, SpriteMetrics, decode_image, dominant_colors,
};

/// A 28x28 PNG with a red "head" (rows 0..23) and a blue "body" (rows 23..28).
fn two_tone_png() -> Vec<u8> {
    let mut data = Vec::with_capacity(28 * 28 * 4);
    for y in 0..28u32 {
        for _x in 0..28u32 {
            data.extend_from_slice(if y < 23 {
                &[255, 0, 0, 255]
            } else {
                &[0, 0, 255, 255]
            });
        }
    }
    let img = image::RgbaImage::from_raw(28, 28, data).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_slice_composite_end_to_end() {
    let params = AnimParams::default();
    let decoded = decode_image(&two_tone_png()).unwrap();
    assert_eq!((decoded.width, decoded.height), (28, 28));

    let metrics = SpriteMetrics::from_container(168, 28, 23).unwrap();
    let sprite = pixelparade::slice(&decoded, metrics).unwrap();
    assert_eq!(sprite.split_line, 138);

    // The slice boundary coincides with the color boundary: the head is all
    // red, the body all blue.
    assert!(sprite.upper.data.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    assert!(sprite.lower.data.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));

    let mut visible = DrawSurface::new(400, 168).unwrap();
    let mut scratch = DrawSurface::new(1, 1).unwrap();
    pixelparade::draw_frame(
        &mut visible,
        &mut scratch,
        &sprite,
        0, // frame 0: no sway, no press
        metrics,
        &FrameTransform::default(),
        &params,
        true,
    )
    .unwrap();

    let px = |x: usize, y: usize| {
        let idx = (y * 400 + x) * 4;
        &visible.data()[idx..idx + 4]
    };
    assert_eq!(px(10, 10), [255, 0, 0, 255]);
    assert_eq!(px(84, 100), [255, 0, 0, 255]);
    assert_eq!(px(84, 150), [0, 0, 255, 255]);
    // Right of the sprite stays untouched.
    assert_eq!(px(200, 84), [0, 0, 0, 0]);

    // Compositing at frame 0 introduces no colors outside the source palette.
    for p in visible.data().chunks_exact(4) {
        assert!(
            p == [0, 0, 0, 0] || p == [255, 0, 0, 255] || p == [0, 0, 255, 255],
            "unexpected color {p:?}"
        );
    }
}

#[test]
fn histogram_matches_the_drawn_sprite() {
    let decoded = decode_image(&two_tone_png()).unwrap();
    let buckets = dominant_colors(&decoded, 5);

    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[0].r, buckets[0].g, buckets[0].b), (255, 0, 0));
    assert_eq!(buckets[0].count, 23 * 28);
    assert_eq!((buckets[1].r, buckets[1].g, buckets[1].b), (0, 0, 255));
    assert_eq!(buckets[1].count, 5 * 28);

    let total: f64 = buckets.iter().map(|b| b.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
}
