//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

/// Deterministic RGBA8 test pattern: red ramps with x, green with y.
pub fn gradient_rgba(w: u32, h: u32) -> Vec<u8> {
    let mut px = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            px.extend_from_slice(&[
                (x * 255 / (w - 1).max(1)) as u8,
                (y * 255 / (h - 1).max(1)) as u8,
                ((x + y) % 256) as u8,
                255,
            ]);
        }
    }
    px
}

/// Color of pattern pixel (x, y) in a `w` x `h` image.
pub fn gradient_at(w: u32, h: u32, x: u32, y: u32) -> [u8; 4] {
    let px = gradient_rgba(w, h);
    let i = ((y * w + x) * 4) as usize;
    [px[i], px[i + 1], px[i + 2], px[i + 3]]
}

/// Binary P6 from RGBA8 (alpha dropped).
pub fn ppm(w: u32, h: u32, rgba: &[u8]) -> Vec<u8> {
    let mut out = format!("P6\n{w} {h}\n255\n").into_bytes();
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}

/// Binary P5 from 8-bit gray samples.
pub fn pgm(w: u32, h: u32, gray: &[u8]) -> Vec<u8> {
    let mut out = format!("P5\n{w} {h}\n255\n").into_bytes();
    out.extend_from_slice(gray);
    out
}

/// P7 RGB_ALPHA from RGBA8.
pub fn pam_rgba(w: u32, h: u32, rgba: &[u8]) -> Vec<u8> {
    let mut out =
        format!("P7\nWIDTH {w}\nHEIGHT {h}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n")
            .into_bytes();
    out.extend_from_slice(rgba);
    out
}

/// Bottom-up 32-bit BI_BITFIELDS BMP (BITMAPV4 header) with an alpha mask.
pub fn bmp_rgba(w: u32, h: u32, rgba: &[u8]) -> Vec<u8> {
    let header_len = 14 + 108;
    let raster_len = w * h * 4;
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(header_len + raster_len).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&108u32.to_le_bytes());
    out.extend_from_slice(&(w as i32).to_le_bytes());
    out.extend_from_slice(&(h as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&3u32.to_le_bytes()); // BI_BITFIELDS
    out.extend_from_slice(&raster_len.to_le_bytes());
    out.extend_from_slice(&[0; 16]); // resolution, colors used/important
    out.extend_from_slice(&0x00FF_0000u32.to_le_bytes());
    out.extend_from_slice(&0x0000_FF00u32.to_le_bytes());
    out.extend_from_slice(&0x0000_00FFu32.to_le_bytes());
    out.extend_from_slice(&0xFF00_0000u32.to_le_bytes());
    out.resize(header_len as usize, 0);
    for y in (0..h).rev() {
        let row = &rgba[(y * w * 4) as usize..((y + 1) * w * 4) as usize];
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
    out
}

/// Top-down 24-bit BI_RGB BMP from RGBA8 (alpha dropped).
pub fn bmp_rgb(w: u32, h: u32, rgba: &[u8]) -> Vec<u8> {
    let stride = (w * 3).div_ceil(4) * 4;
    let raster_len = stride * h;
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54 + raster_len).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(w as i32).to_le_bytes());
    out.extend_from_slice(&(-(h as i32)).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);
    for row in rgba.chunks_exact((w * 4) as usize) {
        let start = out.len();
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        out.resize(start + stride as usize, 0);
    }
    out
}

/// Farbfeld from RGBA8, each sample widened to 16 bits.
pub fn farbfeld(w: u32, h: u32, rgba: &[u8]) -> Vec<u8> {
    let mut out = b"farbfeld".to_vec();
    out.extend_from_slice(&w.to_be_bytes());
    out.extend_from_slice(&h.to_be_bytes());
    for &v in rgba {
        out.extend_from_slice(&[v, v]);
    }
    out
}

/// Gradient PPM, ready to decode.
pub fn gradient_ppm(w: u32, h: u32) -> Vec<u8> {
    ppm(w, h, &gradient_rgba(w, h))
}
