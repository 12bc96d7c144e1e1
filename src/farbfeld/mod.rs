//! Farbfeld region backend.
//!
//! Farbfeld is a simple lossless format: 8-byte magic ("farbfeld"),
//! width/height as u32 big-endian, then RGBA u16 big-endian pixels. Rows are
//! fixed-size, so the index is the row stride alone.

use crate::backend::RegionBackend;
use crate::error::RegionError;
use crate::limits::Limits;
use crate::pixel::{ImageFormat, ImageInfo};
use crate::source::EncodedSource;

const HEADER_LEN: usize = 16;

fn invalid(reason: impl Into<String>) -> RegionError {
    RegionError::index("farbfeld", reason)
}

/// Parse farbfeld header, returning (width, height).
fn parse_header(data: &[u8]) -> Result<(u32, u32), RegionError> {
    if data.len() < HEADER_LEN {
        return Err(invalid("header truncated"));
    }
    if &data[0..8] != b"farbfeld" {
        return Err(invalid("bad magic"));
    }
    let width = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    let height = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);

    if width == 0 {
        return Err(invalid("width is zero"));
    }
    if height == 0 {
        return Err(invalid("height is zero"));
    }
    Ok((width, height))
}

pub(crate) struct FarbfeldBackend {
    source: EncodedSource,
    width: u32,
    height: u32,
    stride: usize,
}

impl FarbfeldBackend {
    pub(crate) fn build(source: EncodedSource, limits: &Limits) -> Result<Self, RegionError> {
        let (width, height) = parse_header(source.as_bytes())?;
        limits.check(width, height)?;
        let stride = (width as usize)
            .checked_mul(8)
            .ok_or_else(|| invalid(format!("{width}x{height} raster overflows")))?;
        let needed = stride
            .checked_mul(height as usize)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| invalid(format!("{width}x{height} raster overflows")))?;
        if source.len() < needed {
            return Err(invalid(format!(
                "truncated raster: need {needed} bytes, got {}",
                source.len()
            )));
        }
        Ok(Self {
            source,
            width,
            height,
            stride,
        })
    }
}

/// Round a 16-bit sample to 8 bits.
#[inline]
fn narrow(hi: u8, lo: u8) -> u8 {
    let v = u32::from(u16::from_be_bytes([hi, lo]));
    ((v * 255 + 32767) / 65535) as u8
}

impl RegionBackend for FarbfeldBackend {
    fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            format: ImageFormat::Farbfeld,
            has_alpha: true,
            is_gray: false,
        }
    }

    fn read_rgba_row(&self, x: u32, y: u32, out: &mut [u8]) -> Result<(), RegionError> {
        let start = HEADER_LEN + y as usize * self.stride + x as usize * 8;
        let len = out.len() / 4 * 8;
        let row = self
            .source
            .as_bytes()
            .get(start..start + len)
            .ok_or_else(|| RegionError::DecodeFailed(format!("row {y} outside raster")))?;
        for (src, px) in row.chunks_exact(8).zip(out.chunks_exact_mut(4)) {
            for c in 0..4 {
                px[c] = narrow(src[c * 2], src[c * 2 + 1]);
            }
        }
        Ok(())
    }
}
