//! Generic subset decode on top of random-access RGBA row reads.
//!
//! Output size is `max(1, floor(extent / sample_size))` per axis. Each output
//! pixel maps to one `sample_size` square block of the clipped source rect;
//! the final block on an axis absorbs nothing past the floor, except when the
//! whole extent is smaller than one block, in which case the block is the
//! whole extent. Point sampling takes the block's center pixel; quality mode
//! averages the block.

use enough::Stop;

use crate::backend::{DecodeParams, DecodeTarget, RegionBackend};
use crate::error::RegionError;
use crate::pixel::PixelLayout;
use crate::rect::{PixelRect, Rect};

/// 4x4 Bayer threshold matrix.
const BAYER4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Source span `[start, end)` covered by output index `i`.
fn block(i: u32, n: u32, extent: u32) -> (u32, u32) {
    let start = i * n;
    (start, start.saturating_add(n).min(extent))
}

pub(crate) fn decode_subset<B: RegionBackend + ?Sized>(
    backend: &B,
    rect: Rect,
    params: &DecodeParams,
    target: &mut DecodeTarget<'_>,
    stop: &dyn Stop,
) -> Result<(), RegionError> {
    if rect.is_empty() {
        return Err(RegionError::DecodeFailed(format!("degenerate rect {rect:?}")));
    }
    let info = backend.info();
    let clip = rect.clip_to(info.width, info.height).ok_or_else(|| {
        RegionError::DecodeFailed(format!(
            "rect {rect:?} outside {}x{} image",
            info.width, info.height
        ))
    })?;
    let n = params.sample_size.max(1);
    let (out_w, out_h) = clip.sampled_size(n);

    stop.check()?;
    let bitmap = target.prepare(out_w, out_h, params.layout)?;
    let out_stride = bitmap.row_bytes();
    let pixels = bitmap.pixels_mut();

    let mut src_row = vec![0u8; clip.width as usize * 4];
    let mut rgba_row = vec![0u8; out_w as usize * 4];
    let mut acc = if params.prefer_quality_over_speed && n > 1 {
        vec![0u64; out_w as usize * 4]
    } else {
        Vec::new()
    };

    for oy in 0..out_h {
        stop.check()?;
        let (y0, y1) = block(oy, n, clip.height);
        if acc.is_empty() {
            let sy = clip.y + y0 + (y1 - y0) / 2;
            backend.read_rgba_row(clip.x, sy, &mut src_row)?;
            point_sample_row(&src_row, &clip, n, &mut rgba_row);
        } else {
            acc.fill(0);
            for sy in y0..y1 {
                backend.read_rgba_row(clip.x, clip.y + sy, &mut src_row)?;
                accumulate_row(&src_row, &clip, n, &mut acc);
            }
            average_row(&acc, &clip, n, y1 - y0, &mut rgba_row);
        }
        let start = oy as usize * out_stride;
        let out = &mut pixels[start..start + out_stride];
        store_row(&rgba_row, params, oy, out);
    }
    Ok(())
}

fn point_sample_row(src: &[u8], clip: &PixelRect, n: u32, out: &mut [u8]) {
    for (ox, px) in out.chunks_exact_mut(4).enumerate() {
        let (x0, x1) = block(ox as u32, n, clip.width);
        let sx = (x0 + (x1 - x0) / 2) as usize * 4;
        px.copy_from_slice(&src[sx..sx + 4]);
    }
}

fn accumulate_row(src: &[u8], clip: &PixelRect, n: u32, acc: &mut [u64]) {
    for (ox, sums) in acc.chunks_exact_mut(4).enumerate() {
        let (x0, x1) = block(ox as u32, n, clip.width);
        for px in src[x0 as usize * 4..x1 as usize * 4].chunks_exact(4) {
            // Weight color by alpha so transparent pixels don't bleed.
            let a = u64::from(px[3]);
            sums[0] += u64::from(px[0]) * a;
            sums[1] += u64::from(px[1]) * a;
            sums[2] += u64::from(px[2]) * a;
            sums[3] += a;
        }
    }
}

fn average_row(acc: &[u64], clip: &PixelRect, n: u32, rows: u32, out: &mut [u8]) {
    for (ox, (sums, px)) in acc.chunks_exact(4).zip(out.chunks_exact_mut(4)).enumerate() {
        let (x0, x1) = block(ox as u32, n, clip.width);
        let count = u64::from(x1 - x0) * u64::from(rows);
        let alpha_sum = sums[3];
        if alpha_sum == 0 {
            px.fill(0);
            continue;
        }
        for c in 0..3 {
            px[c] = ((sums[c] + alpha_sum / 2) / alpha_sum) as u8;
        }
        px[3] = ((alpha_sum + count / 2) / count) as u8;
    }
}

#[inline]
fn premultiply(c: u8, a: u8) -> u8 {
    ((u32::from(c) * u32::from(a) + 127) / 255) as u8
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 150 + u32::from(b) * 29 + 128) >> 8) as u8
}

/// Round to 5-6-5 bits. A Bayer `threshold` shifts the rounding point by
/// up to half a step either way, centered on zero.
fn to_565(r: u8, g: u8, b: u8, threshold: Option<u8>) -> u16 {
    let bias = threshold.map_or(0, |t| (2 * i32::from(t) - 15) * 255 / 32);
    let quantize =
        |v: u8, max: i32| ((i32::from(v) * max + 127 + bias) / 255).clamp(0, max) as u16;
    (quantize(r, 31) << 11) | (quantize(g, 63) << 5) | quantize(b, 31)
}

/// Convert one row of unpremultiplied RGBA8 into the output layout.
fn store_row(rgba: &[u8], params: &DecodeParams, oy: u32, out: &mut [u8]) {
    match params.layout {
        PixelLayout::Rgba8 => {
            out.copy_from_slice(rgba);
            if params.premultiply {
                for px in out.chunks_exact_mut(4) {
                    let a = px[3];
                    if a != 255 {
                        px[0] = premultiply(px[0], a);
                        px[1] = premultiply(px[1], a);
                        px[2] = premultiply(px[2], a);
                    }
                }
            }
        }
        PixelLayout::Rgb565 => {
            let bayer = &BAYER4[(oy & 3) as usize];
            for (ox, (px, dst)) in rgba.chunks_exact(4).zip(out.chunks_exact_mut(2)).enumerate() {
                let threshold = params.dither.then_some(bayer[ox & 3]);
                let v = to_565(px[0], px[1], px[2], threshold);
                dst.copy_from_slice(&v.to_le_bytes());
            }
        }
        PixelLayout::Gray8 => {
            for (px, dst) in rgba.chunks_exact(4).zip(out.iter_mut()) {
                *dst = luma(px[0], px[1], px[2]);
            }
        }
        PixelLayout::Alpha8 => {
            for (px, dst) in rgba.chunks_exact(4).zip(out.iter_mut()) {
                *dst = px[3];
            }
        }
    }
}
