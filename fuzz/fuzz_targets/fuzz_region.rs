#![no_main]
use libfuzzer_sys::fuzz_target;
use zenregion::{DecodeOptions, Limits, PixelLayout, Rect, RegionDecoder};

const LAYOUTS: [PixelLayout; 4] = [
    PixelLayout::Rgba8,
    PixelLayout::Rgb565,
    PixelLayout::Gray8,
    PixelLayout::Alpha8,
];

fuzz_target!(|data: &[u8]| {
    // First 8 bytes steer the region request, the rest is the image.
    if data.len() < 8 {
        return;
    }
    let (ctl, image) = data.split_at(8);
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(64 << 20),
        ..Default::default()
    };
    let Ok(decoder) = RegionDecoder::builder()
        .with_limits(limits)
        .build(zenregion::EncodedSource::from_vec(image.to_vec()))
    else {
        return;
    };

    let w = decoder.width() as i32;
    let h = decoder.height() as i32;
    let left = i32::from(ctl[0] as i8) % w.max(1);
    let top = i32::from(ctl[1] as i8) % h.max(1);
    let rect = Rect::from_xywh(left, top, i32::from(ctl[2]) + 1, i32::from(ctl[3]) + 1);

    let mut opts = DecodeOptions::new()
        .with_sample_size(u32::from(ctl[4] & 0x0f))
        .with_layout(LAYOUTS[usize::from(ctl[5] & 3)])
        .with_dither(ctl[6] & 1 != 0)
        .with_quality_over_speed(ctl[6] & 2 != 0)
        .with_unpremultiplied(ctl[6] & 4 != 0);
    // Must never panic; errors are fine.
    let _ = decoder.decode_region(rect, Some(&mut opts));
    let _ = decoder.decode_region(Rect::new(0, 0, w, h), None);
});
