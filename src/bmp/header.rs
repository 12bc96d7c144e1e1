//! BMP header parsing.
//!
//! Header layout handling follows zune-bmp 0.5.2 by Caleb Etemesi
//! (MIT/Apache-2.0/Zlib), reduced to what random row access needs.

use crate::error::RegionError;
use crate::limits::Limits;

fn invalid(reason: impl Into<String>) -> RegionError {
    RegionError::index("BMP", reason)
}

// ── Cursor for reading from &[u8] ───────────────────────────────────

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn set_position(&mut self, pos: usize) -> Result<(), RegionError> {
        if pos > self.data.len() {
            return Err(invalid("unexpected end of header"));
        }
        self.pos = pos;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<(), RegionError> {
        self.set_position(self.pos.saturating_add(n))
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], RegionError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| invalid("unexpected end of header"))?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        self.pos += N;
        Ok(buf)
    }

    fn u16_le(&mut self) -> Result<u16, RegionError> {
        self.fixed().map(u16::from_le_bytes)
    }

    fn u32_le(&mut self) -> Result<u32, RegionError> {
        self.fixed().map(u32::from_le_bytes)
    }
}

// ── Parsed header ───────────────────────────────────────────────────

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub(crate) enum BmpCompression {
    Rgb,
    Bitfields,
}

impl BmpCompression {
    fn from_u32(num: u32) -> Result<Self, RegionError> {
        match num {
            0 => Ok(Self::Rgb),
            3 | 6 => Ok(Self::Bitfields), // 6 = BI_ALPHABITFIELDS
            1 | 2 => Err(invalid("RLE-compressed BMP has no random row access")),
            other => Err(invalid(format!("unsupported BMP compression {other}"))),
        }
    }
}

/// Everything needed to locate and unpack any row.
#[derive(Debug)]
pub(crate) struct BmpHeader {
    pub width: u32,
    pub height: u32,
    /// Rows stored bottom row first (positive height field).
    pub bottom_up: bool,
    pub bpp: u16,
    pub compression: BmpCompression,
    /// Red, green, blue, alpha masks for 16/32-bit pixels.
    pub masks: [u32; 4],
    /// RGB palette for depths of 8 bits and below.
    pub palette: Vec<[u8; 3]>,
    pub data_offset: usize,
    pub stride: usize,
}

impl BmpHeader {
    pub fn has_alpha(&self) -> bool {
        self.masks[3] != 0
    }

    pub fn is_gray(&self) -> bool {
        !self.palette.is_empty() && self.palette.iter().all(|&[r, g, b]| r == g && g == b)
    }
}

pub(crate) fn parse_header(data: &[u8], limits: &Limits) -> Result<BmpHeader, RegionError> {
    let mut bytes = Cursor::new(data);

    if bytes.fixed::<2>()? != *b"BM" {
        return Err(invalid("bad magic"));
    }
    // File size field is unreliable in the wild.
    let _file_size = bytes.u32_le()?;
    bytes.skip(4)?;
    let data_offset = bytes.u32_le()? as usize;
    let ihsize = bytes.u32_le()?;

    let (width, height, planes, bpp, compression_code, mut colors_used);
    match ihsize {
        12 => {
            // OS/2 BMPv1
            width = i32::from(bytes.u16_le()?);
            height = i32::from(bytes.u16_le()?);
            planes = bytes.u16_le()?;
            bpp = bytes.u16_le()?;
            compression_code = 0;
            colors_used = 0;
        }
        16 | 40 | 52 | 56 | 64 | 108 | 124 => {
            width = bytes.u32_le()? as i32;
            height = bytes.u32_le()? as i32;
            planes = bytes.u16_le()?;
            bpp = bytes.u16_le()?;
            compression_code = if ihsize >= 40 { bytes.u32_le()? } else { 0 };
            colors_used = 0;
            if ihsize >= 40 {
                let _image_size = bytes.u32_le()?;
                let _x_ppm = bytes.u32_le()?;
                let _y_ppm = bytes.u32_le()?;
                colors_used = bytes.u32_le()?;
            }
        }
        _ => return Err(invalid(format!("unknown BMP info header size: {ihsize}"))),
    }
    let compression = BmpCompression::from_u32(compression_code)?;

    if planes != 1 {
        return Err(invalid(format!("planes field is {planes}, expected 1")));
    }
    if width <= 0 {
        return Err(invalid(format!("width is {width}")));
    }
    if height == 0 || height == i32::MIN {
        return Err(invalid(format!("height is {height}")));
    }
    let bottom_up = height > 0;
    let (width, height) = (width as u32, height.unsigned_abs());
    limits.check(width, height)?;

    let mut masks = [0u32; 4];
    match (bpp, compression) {
        (1 | 2 | 4 | 8, BmpCompression::Rgb) | (24, BmpCompression::Rgb) => {}
        (16, BmpCompression::Rgb) => masks = [0x7C00, 0x03E0, 0x001F, 0],
        (32, BmpCompression::Rgb) => masks = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0],
        (16 | 32, BmpCompression::Bitfields) => {
            // Masks follow a 40-byte header, or sit inside a larger one.
            bytes.set_position(14 + 40)?;
            masks[0] = bytes.u32_le()?;
            masks[1] = bytes.u32_le()?;
            masks[2] = bytes.u32_le()?;
            if ihsize >= 56 || compression_code == 6 {
                masks[3] = bytes.u32_le()?;
            }
        }
        _ => {
            return Err(invalid(format!(
                "bit depth {bpp} with {compression:?} compression unsupported"
            )));
        }
    }

    let mut palette = Vec::new();
    if bpp <= 8 {
        let max_colors = 1u32 << bpp;
        if colors_used == 0 || colors_used > max_colors {
            colors_used = max_colors;
        }
        let entry_size = if ihsize == 12 { 3 } else { 4 };
        let palette_offset = 14 + ihsize as usize;
        let available = data_offset.saturating_sub(palette_offset) / entry_size;
        let count = (colors_used as usize).min(available);
        if count == 0 {
            return Err(invalid(format!("missing palette for {bpp}-bit BMP")));
        }
        bytes.set_position(palette_offset)?;
        for _ in 0..count {
            let [b, g, r] = bytes.fixed::<3>()?;
            if entry_size == 4 {
                bytes.skip(1)?;
            }
            palette.push([r, g, b]);
        }
    }

    let too_large = || invalid(format!("{width}x{height} raster overflows"));
    let stride = (width as usize)
        .checked_mul(usize::from(bpp))
        .map(|bits| bits.div_ceil(32) * 4)
        .ok_or_else(too_large)?;
    let needed = stride
        .checked_mul(height as usize)
        .and_then(|n| n.checked_add(data_offset))
        .ok_or_else(too_large)?;
    if data.len() < needed {
        return Err(invalid(format!(
            "truncated raster: need {needed} bytes, got {}",
            data.len()
        )));
    }

    Ok(BmpHeader {
        width,
        height,
        bottom_up,
        bpp,
        compression,
        masks,
        palette,
        data_offset,
        stride,
    })
}
