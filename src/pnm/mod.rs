//! PNM family region backend: P5 (PGM), P6 (PPM), P7 (PAM).
//!
//! Binary PNM rasters are uncompressed and row-major, so the index is just
//! the raster offset and row stride; any row can be read directly.

mod header;

use crate::backend::RegionBackend;
use crate::error::RegionError;
use crate::limits::Limits;
use crate::pixel::{ImageFormat, ImageInfo};
use crate::source::EncodedSource;

/// Which PNM sub-format the stream uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PnmFormat {
    /// P5, binary grayscale.
    Pgm,
    /// P6, binary RGB.
    Ppm,
    /// P7 (PAM), 1 to 4 channels.
    Pam,
}

/// Parsed PNM header (internal).
pub(crate) struct PnmHeader {
    pub format: PnmFormat,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    pub depth: u32,
    pub data_offset: usize,
}

/// Row index over an owned PNM stream.
pub(crate) struct PnmBackend {
    source: EncodedSource,
    header: PnmHeader,
    bytes_per_sample: usize,
    stride: usize,
}

impl PnmBackend {
    pub(crate) fn build(source: EncodedSource, limits: &Limits) -> Result<Self, RegionError> {
        let header = header::parse_header(source.as_bytes())?;
        limits.check(header.width, header.height)?;
        let bytes_per_sample = if header.maxval > 255 { 2 } else { 1 };
        let too_large = || {
            RegionError::index(
                "PNM",
                format!("{}x{} raster overflows", header.width, header.height),
            )
        };
        let stride = (header.width as usize)
            .checked_mul(header.depth as usize * bytes_per_sample)
            .ok_or_else(too_large)?;
        let needed = stride
            .checked_mul(header.height as usize)
            .and_then(|n| n.checked_add(header.data_offset))
            .ok_or_else(too_large)?;
        if source.len() < needed {
            return Err(RegionError::index(
                "PNM",
                format!("truncated raster: need {needed} bytes, got {}", source.len()),
            ));
        }
        log::trace!(
            "PNM {:?} depth {} maxval {} raster at {}",
            header.format,
            header.depth,
            header.maxval,
            header.data_offset
        );
        Ok(Self {
            source,
            header,
            bytes_per_sample,
            stride,
        })
    }

    #[inline]
    fn sample(&self, bytes: &[u8]) -> u8 {
        let maxval = self.header.maxval;
        let v = if self.bytes_per_sample == 2 {
            u32::from(u16::from_be_bytes([bytes[0], bytes[1]]))
        } else {
            u32::from(bytes[0])
        };
        if maxval == 255 {
            return v as u8;
        }
        ((v.min(maxval) * 255 + maxval / 2) / maxval) as u8
    }
}

impl RegionBackend for PnmBackend {
    fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.header.width,
            height: self.header.height,
            format: ImageFormat::Pnm,
            has_alpha: matches!(self.header.depth, 2 | 4),
            is_gray: self.header.depth <= 2,
        }
    }

    fn read_rgba_row(&self, x: u32, y: u32, out: &mut [u8]) -> Result<(), RegionError> {
        let depth = self.header.depth as usize;
        let pixel_bytes = depth * self.bytes_per_sample;
        let start = self.header.data_offset + y as usize * self.stride + x as usize * pixel_bytes;
        let len = out.len() / 4 * pixel_bytes;
        let row = self
            .source
            .as_bytes()
            .get(start..start + len)
            .ok_or_else(|| RegionError::DecodeFailed(format!("row {y} outside raster")))?;

        let bps = self.bytes_per_sample;
        for (src, px) in row.chunks_exact(pixel_bytes).zip(out.chunks_exact_mut(4)) {
            let s = |i: usize| self.sample(&src[i * bps..]);
            let rgba = match depth {
                1 => {
                    let g = s(0);
                    [g, g, g, 255]
                }
                2 => {
                    let g = s(0);
                    [g, g, g, s(1)]
                }
                3 => [s(0), s(1), s(2), 255],
                _ => [s(0), s(1), s(2), s(3)],
            };
            px.copy_from_slice(&rgba);
        }
        Ok(())
    }
}
