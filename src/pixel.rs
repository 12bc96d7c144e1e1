/// Encoded image format, as detected from magic bytes or reported by a backend.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// PNM family: PGM (P5), PPM (P6), PAM (P7).
    Pnm,
    /// BMP (Windows bitmap).
    Bmp,
    /// Farbfeld (RGBA 16-bit).
    Farbfeld,
    /// A format served by a caller-registered backend.
    Custom {
        name: &'static str,
        mime: &'static str,
    },
}

impl ImageFormat {
    /// Detect a built-in format from the leading bytes of a stream.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [b'P', b'5' | b'6' | b'7', ..] => Some(Self::Pnm),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ if data.starts_with(b"farbfeld") => Some(Self::Farbfeld),
            _ => None,
        }
    }

    /// Short decoder name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pnm => "PNM",
            Self::Bmp => "BMP",
            Self::Farbfeld => "farbfeld",
            Self::Custom { name, .. } => name,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pnm => "image/x-portable-anymap",
            Self::Bmp => "image/bmp",
            Self::Farbfeld => "image/x-farbfeld",
            Self::Custom { mime, .. } => mime,
        }
    }
}

/// Memory layout of a decoded [`Bitmap`](crate::Bitmap).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// 4 channels, 8-bit RGBA. Premultiplied unless the bitmap says otherwise.
    #[default]
    Rgba8,
    /// 16-bit packed R5 G6 B5, little-endian. Opaque.
    Rgb565,
    /// Single channel, 8-bit luma. Opaque.
    Gray8,
    /// Single channel, 8-bit alpha coverage.
    Alpha8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb565 => 2,
            Self::Gray8 | Self::Alpha8 => 1,
        }
    }

    /// Whether color channels can be scaled by alpha in this layout.
    pub fn supports_premultiplied(&self) -> bool {
        matches!(self, Self::Rgba8)
    }

    /// Byte length of a tightly packed `width` x `height` buffer.
    pub(crate) fn buffer_len(&self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }
}

/// What a backend found while building its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// Whether the source carries an alpha channel.
    pub has_alpha: bool,
    /// Whether the source is single-channel luma.
    pub is_gray: bool,
}
