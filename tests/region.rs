mod common;

use std::io::Cursor;
use std::sync::Arc;

use common::*;
use zenregion::*;

fn decoder_for(data: Vec<u8>) -> RegionDecoder {
    RegionDecoder::new(EncodedSource::from_vec(data)).unwrap()
}

fn gradient_decoder(w: u32, h: u32) -> RegionDecoder {
    decoder_for(gradient_ppm(w, h))
}

#[test]
fn quarter_region_at_full_resolution() {
    let decoder = gradient_decoder(100, 100);
    let region = decoder.decode_region(Rect::new(0, 0, 50, 50), None).unwrap();
    assert_eq!((region.width(), region.height()), (50, 50));
    assert_eq!(region.format, ImageFormat::Pnm);
    assert!(!region.reused);
    for (x, y) in [(0, 0), (49, 0), (0, 49), (25, 31), (49, 49)] {
        assert_eq!(
            region.bitmap.pixel(x, y).unwrap(),
            &gradient_at(100, 100, x, y)[..],
            "pixel ({x}, {y})"
        );
    }
}

#[test]
fn full_image_at_half_resolution() {
    let decoder = gradient_decoder(100, 100);
    let mut opts = DecodeOptions::new().with_sample_size(2);
    let region = decoder
        .decode_region(Rect::new(0, 0, 100, 100), Some(&mut opts))
        .unwrap();
    assert_eq!((region.width(), region.height()), (50, 50));
    assert_eq!((opts.out_width, opts.out_height), (Some(50), Some(50)));
    // Point sampling reads the center of each 2x2 block.
    for (ox, oy) in [(0, 0), (10, 20), (49, 49)] {
        assert_eq!(
            region.bitmap.pixel(ox, oy).unwrap(),
            &gradient_at(100, 100, ox * 2 + 1, oy * 2 + 1)[..]
        );
    }
}

#[test]
fn full_rect_matches_image_size_and_dimensions_are_stable() {
    let decoder = gradient_decoder(37, 23);
    assert_eq!((decoder.width(), decoder.height()), (37, 23));
    let region = decoder.decode_region_xywh(0, 0, 37, 23, None).unwrap();
    assert_eq!((region.width(), region.height()), (37, 23));
    for _ in 0..3 {
        decoder.decode_region(Rect::new(5, 5, 10, 10), None).unwrap();
        assert_eq!((decoder.width(), decoder.height()), (37, 23));
    }
}

#[test]
fn odd_extents_floor_and_never_vanish() {
    let decoder = gradient_decoder(9, 7);
    let mut opts = DecodeOptions::new().with_sample_size(4);
    let region = decoder.decode_region(Rect::new(0, 0, 9, 7), Some(&mut opts)).unwrap();
    assert_eq!((region.width(), region.height()), (2, 1));

    let mut opts = DecodeOptions::new().with_sample_size(64);
    let region = decoder.decode_region(Rect::new(2, 2, 5, 4), Some(&mut opts)).unwrap();
    assert_eq!((region.width(), region.height()), (1, 1));

    let mut opts = DecodeOptions::new().with_sample_size(0);
    let region = decoder.decode_region(Rect::new(0, 0, 9, 7), Some(&mut opts)).unwrap();
    assert_eq!((region.width(), region.height()), (9, 7));
}

#[test]
fn reuse_bitmap_of_matching_size() {
    let decoder = gradient_decoder(100, 100);
    let first = decoder.decode_region(Rect::new(0, 0, 50, 50), None).unwrap();
    let generation = first.bitmap.generation_id();
    let capacity = first.bitmap.capacity_bytes();
    let ptr = first.bitmap.pixels().as_ptr();

    let mut opts = DecodeOptions::new().with_reuse(first.bitmap);
    let second = decoder
        .decode_region(Rect::new(50, 50, 100, 100), Some(&mut opts))
        .unwrap();
    assert!(second.reused);
    assert!(opts.reuse.is_none());
    assert_eq!((second.width(), second.height()), (50, 50));
    assert_eq!(second.bitmap.capacity_bytes(), capacity);
    assert_eq!(second.bitmap.pixels().as_ptr(), ptr);
    assert_ne!(second.bitmap.generation_id(), generation);
    assert_eq!(second.bitmap.pixel(0, 0).unwrap(), &gradient_at(100, 100, 50, 50)[..]);
    assert_eq!(opts.out_width, Some(50));
}

#[test]
fn reuse_bitmap_too_small_is_rejected_and_returned() {
    let decoder = gradient_decoder(100, 100);
    let small = Bitmap::new(10, 10, PixelLayout::Rgba8).unwrap();
    let mut opts = DecodeOptions::new().with_reuse(small);
    opts.out_width = Some(999);

    let err = decoder
        .decode_region(Rect::new(0, 0, 50, 50), Some(&mut opts))
        .unwrap_err();
    assert!(matches!(err, RegionError::DecodeFailed(_)), "{err:?}");
    let back = opts.reuse.as_ref().unwrap();
    assert_eq!((back.width(), back.height()), (10, 10));
    assert_eq!(opts.out_width, None);

    // The handle and the bitmap both stay usable.
    let ok = decoder
        .decode_region(Rect::new(0, 0, 10, 10), Some(&mut opts))
        .unwrap();
    assert!(ok.reused);
}

#[test]
fn reuse_leaves_no_stale_pixels() {
    let decoder = decoder_for(pgm(4, 4, &[0x11; 16]));
    let mut big = Bitmap::new(8, 8, PixelLayout::Gray8).unwrap();
    big.pixels_mut().fill(0xEE);

    let mut opts = DecodeOptions::new().with_reuse(big);
    let region = decoder
        .decode_region(Rect::new(0, 0, 3, 2), Some(&mut opts))
        .unwrap();
    assert!(region.reused);
    assert_eq!(region.bitmap.layout(), PixelLayout::Gray8);
    assert_eq!(region.bitmap.pixels(), &[0x11; 6]);
}

#[test]
fn reused_layout_is_kept_without_preference() {
    let decoder = gradient_decoder(8, 8);
    let reuse = Bitmap::new(8, 8, PixelLayout::Rgb565).unwrap();
    let mut opts = DecodeOptions::new().with_reuse(reuse);
    let region = decoder.decode_region(Rect::new(0, 0, 8, 8), Some(&mut opts)).unwrap();
    assert_eq!(region.bitmap.layout(), PixelLayout::Rgb565);
}

#[test]
fn sequential_decodes_do_not_leak_premultiplication() {
    let rgba = [200, 100, 50, 128, 10, 20, 30, 255, 0, 0, 0, 0, 255, 255, 255, 64];
    let decoder = decoder_for(pam_rgba(2, 2, &rgba));

    let mut straight = DecodeOptions::new().with_unpremultiplied(true);
    let a = decoder.decode_region(Rect::new(0, 0, 2, 2), Some(&mut straight)).unwrap();
    let b = decoder.decode_region(Rect::new(0, 0, 1, 2), None).unwrap();
    let c = decoder.decode_region(Rect::new(0, 0, 2, 1), Some(&mut straight)).unwrap();

    assert!(!a.bitmap.is_premultiplied());
    assert_eq!(a.bitmap.pixels(), &rgba[..]);
    assert!(b.bitmap.is_premultiplied());
    assert_eq!(b.bitmap.pixel(0, 0).unwrap(), &[100, 50, 25, 128]);
    assert!(!c.bitmap.is_premultiplied());
    assert_eq!(c.bitmap.pixels(), &rgba[..8]);
}

#[test]
fn concurrent_decodes_keep_their_own_settings() {
    let w = 16;
    let h = 16;
    let mut rgba = gradient_rgba(w, h);
    for px in rgba.chunks_exact_mut(4) {
        px[3] = 128;
    }
    let decoder = Arc::new(decoder_for(pam_rgba(w, h, &rgba)));
    let expected = gradient_at(w, h, 6, 6);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let decoder = Arc::clone(&decoder);
            std::thread::spawn(move || {
                let straight = i % 2 == 1;
                let mut opts = DecodeOptions::new().with_unpremultiplied(straight);
                for _ in 0..20 {
                    let region = decoder
                        .decode_region(Rect::new(4, 4, 12, 12), Some(&mut opts))
                        .unwrap();
                    assert_eq!(region.bitmap.is_premultiplied(), !straight);
                    let px = region.bitmap.pixel(2, 2).unwrap().to_vec();
                    if straight {
                        assert_eq!(px[..3], expected[..3]);
                    } else {
                        let scaled = ((u32::from(expected[0]) * 128 + 127) / 255) as u8;
                        assert_eq!(px[0], scaled);
                    }
                    assert_eq!(px[3], 128);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn degenerate_and_outside_rects_fail_without_poisoning() {
    let decoder = gradient_decoder(20, 20);
    let mut opts = DecodeOptions::new();
    for rect in [
        Rect::new(5, 5, 5, 10),
        Rect::new(10, 10, 5, 5),
        Rect::new(20, 0, 30, 10),
        Rect::new(-10, -10, 0, 0),
    ] {
        let err = decoder.decode_region(rect, Some(&mut opts)).unwrap_err();
        assert!(matches!(err, RegionError::DecodeFailed(_)), "{rect:?}: {err:?}");
        assert_eq!(opts.out_width, None);
    }
    assert!(decoder.decode_region(Rect::new(0, 0, 20, 20), None).is_ok());
}

#[test]
fn partially_outside_rect_is_clipped() {
    let decoder = gradient_decoder(20, 20);
    let region = decoder.decode_region(Rect::new(-5, 15, 10, 40), None).unwrap();
    assert_eq!((region.width(), region.height()), (10, 5));
    assert_eq!(region.bitmap.pixel(0, 0).unwrap(), &gradient_at(20, 20, 0, 15)[..]);
}

#[test]
fn outputs_are_written_back() {
    let decoder = gradient_decoder(30, 10);
    let mut opts = DecodeOptions::new().with_sample_size(3);
    decoder.decode_region(Rect::new(0, 0, 30, 10), Some(&mut opts)).unwrap();
    assert_eq!(opts.out_width, Some(10));
    assert_eq!(opts.out_height, Some(3));
    assert_eq!(opts.out_format, Some(ImageFormat::Pnm));
    assert_eq!(opts.out_mime_type(), Some("image/x-portable-anymap"));
}

#[test]
fn gray_and_alpha_layouts() {
    let gray: Vec<u8> = (0..16).map(|v| v * 16).collect();
    let decoder = decoder_for(pgm(4, 4, &gray));
    assert_eq!(decoder.native_layout(), PixelLayout::Gray8);
    let mut opts = DecodeOptions::new().with_layout(PixelLayout::Gray8);
    let region = decoder.decode_region(Rect::new(0, 0, 4, 4), Some(&mut opts)).unwrap();
    assert_eq!(region.bitmap.pixels(), &gray[..]);
    assert!(!region.bitmap.is_premultiplied());

    let rgba = [10, 20, 30, 0, 40, 50, 60, 77];
    let decoder = decoder_for(pam_rgba(2, 1, &rgba));
    assert_eq!(decoder.native_layout(), PixelLayout::Rgba8);
    let mut opts = DecodeOptions::new().with_layout(PixelLayout::Alpha8);
    let region = decoder.decode_region(Rect::new(0, 0, 2, 1), Some(&mut opts)).unwrap();
    assert_eq!(region.bitmap.pixels(), &[0, 77]);
}

#[test]
fn rgb565_pure_colors_and_dither() {
    let rgba = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 0, 0, 0, 255];
    let decoder = decoder_for(ppm(4, 1, &rgba));
    let mut opts = DecodeOptions::new()
        .with_layout(PixelLayout::Rgb565)
        .with_dither(false);
    let region = decoder.decode_region(Rect::new(0, 0, 4, 1), Some(&mut opts)).unwrap();
    let words: Vec<u16> = region
        .bitmap
        .pixels()
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(words, [0xF800, 0x07E0, 0x001F, 0x0000]);

    // A flat midtone quantizes to one value undithered, several dithered.
    let flat = decoder_for(pgm(8, 8, &[101; 64]));
    let distinct = |dither: bool| {
        let mut opts = DecodeOptions::new()
            .with_layout(PixelLayout::Rgb565)
            .with_dither(dither);
        let region = flat.decode_region(Rect::new(0, 0, 8, 8), Some(&mut opts)).unwrap();
        let mut words: Vec<&[u8]> = region.bitmap.pixels().chunks_exact(2).collect();
        words.sort();
        words.dedup();
        words.len()
    };
    assert_eq!(distinct(false), 1);
    assert!(distinct(true) > 1);
}

#[test]
fn quality_mode_averages_blocks() {
    let gray = [0, 100, 200, 255, 50, 50, 50, 50];
    let decoder = decoder_for(pgm(4, 2, &gray));
    let mut fast = DecodeOptions::new()
        .with_sample_size(2)
        .with_layout(PixelLayout::Gray8);
    let point = decoder.decode_region(Rect::new(0, 0, 4, 2), Some(&mut fast)).unwrap();
    assert_eq!(point.bitmap.pixels(), &[50, 50]);

    let mut slow = DecodeOptions::new()
        .with_sample_size(2)
        .with_layout(PixelLayout::Gray8)
        .with_quality_over_speed(true);
    let boxed = decoder.decode_region(Rect::new(0, 0, 4, 2), Some(&mut slow)).unwrap();
    assert_eq!(boxed.bitmap.pixels(), &[50, 139]);
}

#[test]
fn bmp_and_farbfeld_regions_match_pattern() {
    let (w, h) = (12, 9);
    let rgba = gradient_rgba(w, h);
    for data in [bmp_rgb(w, h, &rgba), bmp_rgba(w, h, &rgba), farbfeld(w, h, &rgba)] {
        let decoder = decoder_for(data);
        let region = decoder.decode_region(Rect::new(3, 2, 11, 9), None).unwrap();
        assert_eq!((region.width(), region.height()), (8, 7));
        for (x, y) in [(0, 0), (7, 6), (4, 3)] {
            assert_eq!(
                region.bitmap.pixel(x, y).unwrap(),
                &gradient_at(w, h, x + 3, y + 2)[..],
                "{:?} ({x}, {y})",
                decoder.format()
            );
        }
    }
}

#[test]
fn bmp_alpha_is_premultiplied() {
    let rgba = [200, 100, 50, 128];
    let decoder = decoder_for(bmp_rgba(1, 1, &rgba));
    assert!(decoder.info().has_alpha);
    let region = decoder.decode_region(Rect::new(0, 0, 1, 1), None).unwrap();
    assert_eq!(region.bitmap.pixels(), &[100, 50, 25, 128]);
}

#[test]
fn entry_points_agree() {
    let data = gradient_ppm(16, 8);
    let mut padded = vec![0xAAu8; 5];
    padded.extend_from_slice(&data);
    padded.extend_from_slice(&[0xBB; 3]);

    let from_bytes = RegionDecoder::from_bytes(&padded, 5, data.len()).unwrap();
    let from_reader = RegionDecoder::from_reader(Cursor::new(data.clone())).unwrap();

    let path = std::env::temp_dir().join(format!("zenregion-entry-{}.ppm", std::process::id()));
    std::fs::write(&path, &data).unwrap();
    let from_path = RegionDecoder::from_path(&path).unwrap();
    let mut file = std::fs::File::open(&path).unwrap();
    // A caller that already sniffed the header still gets the whole file.
    let mut magic = [0u8; 2];
    std::io::Read::read_exact(&mut file, &mut magic).unwrap();
    assert_eq!(&magic, b"P6");
    let from_file = RegionDecoder::from_file(&file).unwrap();
    drop(file);
    std::fs::remove_file(&path).unwrap();

    struct Packed(Vec<u8>);
    impl Asset for Packed {
        fn buffer(&mut self) -> Option<&[u8]> {
            Some(&self.0)
        }
    }
    let from_asset = RegionDecoder::from_asset(&mut Packed(data.clone())).unwrap();

    let reference = from_bytes.decode_region(Rect::new(2, 1, 14, 7), None).unwrap();
    for decoder in [from_reader, from_path, from_file, from_asset] {
        let region = decoder.decode_region(Rect::new(2, 1, 14, 7), None).unwrap();
        assert_eq!(region.bitmap.pixels(), reference.bitmap.pixels());
        decoder.close();
    }
}

#[test]
fn bad_entry_points_report_descriptor_errors() {
    assert!(matches!(
        RegionDecoder::from_bytes(&[1, 2, 3], 2, 5),
        Err(RegionError::InvalidDescriptor(_))
    ));
    assert!(matches!(
        RegionDecoder::from_path("/nonexistent/zenregion/missing.ppm"),
        Err(RegionError::InvalidDescriptor(_))
    ));

    struct Unavailable;
    impl Asset for Unavailable {
        fn buffer(&mut self) -> Option<&[u8]> {
            None
        }
    }
    assert!(matches!(
        RegionDecoder::from_asset(&mut Unavailable),
        Err(RegionError::InvalidDescriptor(_))
    ));
}
