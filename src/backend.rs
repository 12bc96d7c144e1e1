//! Format backends and backend selection.
//!
//! A backend is built once per encoded stream: it parses the headers, builds
//! whatever index it needs for random access, and then serves any number of
//! subset decodes through `&self`. Per-call settings arrive as an immutable
//! [`DecodeParams`] block, so a backend never holds mutable decode state.

use std::fmt;
use std::sync::Arc;

use enough::Stop;

use crate::bitmap::Bitmap;
use crate::error::RegionError;
use crate::limits::Limits;
use crate::pixel::{ImageFormat, ImageInfo, PixelLayout};
use crate::rect::Rect;
use crate::source::EncodedSource;

/// Settings for one subset decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeParams {
    /// Downscale factor, at least 1.
    pub sample_size: u32,
    pub layout: PixelLayout,
    pub dither: bool,
    pub prefer_quality_over_speed: bool,
    /// Scale color by alpha in the output.
    pub premultiply: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            sample_size: 1,
            layout: PixelLayout::Rgba8,
            dither: true,
            prefer_quality_over_speed: false,
            premultiply: true,
        }
    }
}

/// Output storage for one subset decode.
///
/// Wraps either a caller-supplied bitmap to decode into, or nothing, in which
/// case [`prepare`](DecodeTarget::prepare) allocates a fresh bitmap. Both
/// paths enforce the handle's memory [`Limits`].
pub struct DecodeTarget<'a> {
    bitmap: Option<Bitmap>,
    reused: bool,
    /// A reused bitmap was reshaped, so its old content is gone.
    touched: bool,
    limits: &'a Limits,
}

impl<'a> DecodeTarget<'a> {
    pub(crate) fn new(reuse: Option<Bitmap>, limits: &'a Limits) -> Self {
        Self {
            reused: reuse.is_some(),
            bitmap: reuse,
            touched: false,
            limits,
        }
    }

    /// Whether the target wraps a caller-supplied bitmap.
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    /// Whether [`prepare`](DecodeTarget::prepare) has reshaped a reused bitmap.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Get a bitmap of exactly `width` x `height` in `layout`.
    ///
    /// A reused bitmap is reshaped inside its existing allocation; if that
    /// allocation is too small the decode is rejected.
    pub fn prepare(
        &mut self,
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<&mut Bitmap, RegionError> {
        let bytes = layout.buffer_len(width, height).ok_or_else(|| {
            RegionError::LimitExceeded(format!("output {width}x{height} overflows"))
        })?;
        self.limits.check_memory(bytes)?;

        if self.reused {
            let bitmap = self
                .bitmap
                .as_mut()
                .ok_or_else(|| RegionError::DecodeFailed("reuse bitmap already taken".into()))?;
            if !bitmap.reconfigure(width, height, layout) {
                return Err(RegionError::DecodeFailed(format!(
                    "reuse bitmap holds {} bytes, {width}x{height} {layout:?} needs {bytes}",
                    bitmap.capacity_bytes()
                )));
            }
            self.touched = true;
            return Ok(bitmap);
        }
        Ok(self.bitmap.insert(Bitmap::new(width, height, layout)?))
    }

    pub(crate) fn into_bitmap(self) -> Option<Bitmap> {
        self.bitmap
    }
}

/// One indexed encoded image, ready for random-access subset decodes.
///
/// Implementors provide [`info`](RegionBackend::info) and
/// [`read_rgba_row`](RegionBackend::read_rgba_row); the provided
/// [`decode_subset`](RegionBackend::decode_subset) clips, samples and converts
/// on top of those. Backends with a faster native path override it.
pub trait RegionBackend: Send + Sync {
    /// Dimensions and format discovered while indexing.
    fn info(&self) -> ImageInfo;

    /// Read `out.len() / 4` pixels of row `y`, starting at column `x`, as
    /// unpremultiplied RGBA8. The span is always inside the image.
    fn read_rgba_row(&self, x: u32, y: u32, out: &mut [u8]) -> Result<(), RegionError>;

    /// Decode `rect` at `params.sample_size` into `target`.
    ///
    /// The rect is clipped to the image; an empty result is an error.
    fn decode_subset(
        &self,
        rect: Rect,
        params: &DecodeParams,
        target: &mut DecodeTarget<'_>,
        stop: &dyn Stop,
    ) -> Result<(), RegionError> {
        crate::sample::decode_subset(self, rect, params, target, stop)
    }
}

/// Recognizes one encoded format and builds its backend.
pub trait BackendFactory: Send + Sync {
    fn format(&self) -> ImageFormat;

    /// Whether `header` (the leading bytes of the stream) looks like this format.
    fn sniff(&self, header: &[u8]) -> bool;

    /// Parse and index `source`, taking ownership of it.
    ///
    /// Implementations should check the image dimensions against `limits`
    /// as soon as the header is parsed, before building anything larger.
    fn build_index(
        &self,
        source: EncodedSource,
        limits: &Limits,
    ) -> Result<Box<dyn RegionBackend>, RegionError>;
}

/// Built-in backends, dispatched by tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinBackend {
    #[cfg(feature = "pnm")]
    Pnm,
    #[cfg(feature = "bmp")]
    Bmp,
    #[cfg(feature = "farbfeld")]
    Farbfeld,
}

impl BuiltinBackend {
    pub const ALL: &'static [BuiltinBackend] = &[
        #[cfg(feature = "pnm")]
        BuiltinBackend::Pnm,
        #[cfg(feature = "bmp")]
        BuiltinBackend::Bmp,
        #[cfg(feature = "farbfeld")]
        BuiltinBackend::Farbfeld,
    ];
}

impl BackendFactory for BuiltinBackend {
    fn format(&self) -> ImageFormat {
        match *self {
            #[cfg(feature = "pnm")]
            Self::Pnm => ImageFormat::Pnm,
            #[cfg(feature = "bmp")]
            Self::Bmp => ImageFormat::Bmp,
            #[cfg(feature = "farbfeld")]
            Self::Farbfeld => ImageFormat::Farbfeld,
        }
    }

    fn sniff(&self, header: &[u8]) -> bool {
        ImageFormat::detect(header) == Some(self.format())
    }

    fn build_index(
        &self,
        source: EncodedSource,
        limits: &Limits,
    ) -> Result<Box<dyn RegionBackend>, RegionError> {
        match *self {
            #[cfg(feature = "pnm")]
            Self::Pnm => Ok(Box::new(crate::pnm::PnmBackend::build(source, limits)?)),
            #[cfg(feature = "bmp")]
            Self::Bmp => Ok(Box::new(crate::bmp::BmpBackend::build(source, limits)?)),
            #[cfg(feature = "farbfeld")]
            Self::Farbfeld => Ok(Box::new(crate::farbfeld::FarbfeldBackend::build(
                source, limits,
            )?)),
        }
    }
}

/// Ordered set of backend factories consulted when a decoder is created.
#[derive(Clone)]
pub struct Backends {
    factories: Vec<Arc<dyn BackendFactory>>,
}

impl Default for Backends {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Backends {
    /// No backends at all. Every stream is unsupported.
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// All compiled-in backends.
    pub fn builtin() -> Self {
        let mut backends = Self::empty();
        for &builtin in BuiltinBackend::ALL {
            backends = backends.with(builtin);
        }
        backends
    }

    /// Append a factory. Earlier factories win when several sniff a match.
    pub fn with(mut self, factory: impl BackendFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Place a factory ahead of all existing ones.
    pub fn with_first(mut self, factory: impl BackendFactory + 'static) -> Self {
        self.factories.insert(0, Arc::new(factory));
        self
    }

    pub fn formats(&self) -> impl Iterator<Item = ImageFormat> + '_ {
        self.factories.iter().map(|f| f.format())
    }

    pub(crate) fn select(&self, header: &[u8]) -> Option<&dyn BackendFactory> {
        self.factories
            .iter()
            .find(|f| f.sniff(header))
            .map(|f| f.as_ref())
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.formats()).finish()
    }
}
