//! BMP region backend.
//!
//! Uncompressed and bitfield BMP rasters have a fixed row stride, so the index
//! is the raster offset, stride and row order plus the palette or channel
//! masks needed to unpack a pixel. RLE streams have no fixed row positions
//! and are rejected at index time.

mod header;
mod utils;

use header::BmpHeader;
use utils::{expand_bits_to_byte, mask_channel};

use crate::backend::RegionBackend;
use crate::error::RegionError;
use crate::limits::Limits;
use crate::pixel::{ImageFormat, ImageInfo};
use crate::source::EncodedSource;

pub(crate) struct BmpBackend {
    source: EncodedSource,
    header: BmpHeader,
}

impl BmpBackend {
    pub(crate) fn build(source: EncodedSource, limits: &Limits) -> Result<Self, RegionError> {
        let header = header::parse_header(source.as_bytes(), limits)?;
        log::trace!(
            "BMP {}bpp {:?} {} raster at {} stride {}",
            header.bpp,
            header.compression,
            if header.bottom_up { "bottom-up" } else { "top-down" },
            header.data_offset,
            header.stride
        );
        Ok(Self { source, header })
    }

    fn row(&self, y: u32) -> Result<&[u8], RegionError> {
        let h = &self.header;
        let stored = if h.bottom_up { h.height - 1 - y } else { y };
        let start = h.data_offset + stored as usize * h.stride;
        self.source
            .as_bytes()
            .get(start..start + h.stride)
            .ok_or_else(|| RegionError::DecodeFailed(format!("row {y} outside raster")))
    }

    fn palette_rgba(&self, index: u8) -> [u8; 4] {
        // Out-of-range indices decode as black.
        match self.header.palette.get(usize::from(index)) {
            Some(&[r, g, b]) => [r, g, b, 255],
            None => [0, 0, 0, 255],
        }
    }

    fn masked_rgba(&self, v: u32) -> [u8; 4] {
        let [rm, gm, bm, am] = self.header.masks;
        let a = if am == 0 { 255 } else { mask_channel(v, am) };
        [mask_channel(v, rm), mask_channel(v, gm), mask_channel(v, bm), a]
    }
}

impl RegionBackend for BmpBackend {
    fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.header.width,
            height: self.header.height,
            format: ImageFormat::Bmp,
            has_alpha: self.header.has_alpha(),
            is_gray: self.header.is_gray(),
        }
    }

    fn read_rgba_row(&self, x: u32, y: u32, out: &mut [u8]) -> Result<(), RegionError> {
        let row = self.row(y)?;
        let count = out.len() / 4;
        let x = x as usize;
        let truncated = || RegionError::DecodeFailed(format!("row {y} span outside raster"));

        match self.header.bpp {
            bpp @ (1 | 2 | 4) => {
                let depth = usize::from(bpp);
                let first_bit = x * depth;
                let skip = (first_bit % 8) / depth;
                let start = first_bit / 8;
                let end = ((x + count) * depth).div_ceil(8);
                let packed = row.get(start..end).ok_or_else(truncated)?;
                let mut indices = vec![0u8; skip + count];
                expand_bits_to_byte(depth, packed, &mut indices);
                for (&idx, px) in indices[skip..].iter().zip(out.chunks_exact_mut(4)) {
                    px.copy_from_slice(&self.palette_rgba(idx));
                }
            }
            8 => {
                let span = row.get(x..x + count).ok_or_else(truncated)?;
                for (&idx, px) in span.iter().zip(out.chunks_exact_mut(4)) {
                    px.copy_from_slice(&self.palette_rgba(idx));
                }
            }
            16 => {
                let span = row.get(x * 2..(x + count) * 2).ok_or_else(truncated)?;
                for (src, px) in span.chunks_exact(2).zip(out.chunks_exact_mut(4)) {
                    let v = u32::from(u16::from_le_bytes([src[0], src[1]]));
                    px.copy_from_slice(&self.masked_rgba(v));
                }
            }
            24 => {
                let span = row.get(x * 3..(x + count) * 3).ok_or_else(truncated)?;
                for (src, px) in span.chunks_exact(3).zip(out.chunks_exact_mut(4)) {
                    px.copy_from_slice(&[src[2], src[1], src[0], 255]);
                }
            }
            32 => {
                let span = row.get(x * 4..(x + count) * 4).ok_or_else(truncated)?;
                for (src, px) in span.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
                    let v = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
                    px.copy_from_slice(&self.masked_rgba(v));
                }
            }
            other => {
                return Err(RegionError::DecodeFailed(format!("{other}-bit rows unsupported")));
            }
        }
        Ok(())
    }
}
