use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::backend::{Backends, DecodeParams, DecodeTarget, RegionBackend};
use crate::bitmap::Bitmap;
use crate::cancel::CancelGuard;
use crate::error::RegionError;
use crate::limits::Limits;
use crate::options::DecodeOptions;
use crate::pixel::{ImageFormat, ImageInfo, PixelLayout};
use crate::rect::Rect;
use crate::source::{Asset, EncodedSource};

/// Output of one region decode.
#[derive(Clone, Debug)]
pub struct DecodedRegion {
    pub bitmap: Bitmap,
    /// Format of the encoded source.
    pub format: ImageFormat,
    /// Whether `bitmap` is the caller's reused buffer.
    pub reused: bool,
}

impl DecodedRegion {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// Configures how a [`RegionDecoder`] is created.
#[derive(Clone, Debug, Default)]
pub struct RegionDecoderBuilder {
    backends: Backends,
    limits: Limits,
}

impl RegionDecoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of backends consulted for format sniffing.
    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    /// Set resource limits, enforced at index build and on every output buffer.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Select a backend for `source`, hand it the source and build its index.
    ///
    /// `source` is consumed on every path: moved into the backend on success,
    /// dropped on failure.
    pub fn build(self, source: EncodedSource) -> Result<RegionDecoder, RegionError> {
        let Some(factory) = self.backends.select(source.as_bytes()) else {
            log::warn!("no backend recognizes {}-byte stream", source.len());
            return Err(RegionError::UnsupportedFormat);
        };
        let format = factory.format();

        let backend = factory.build_index(source, &self.limits).map_err(|e| {
            log::warn!("{} index build failed: {e}", format.name());
            match e {
                e @ (RegionError::IndexBuildFailed { .. }
                | RegionError::LimitExceeded(_)
                | RegionError::Cancelled(_)) => e,
                other => RegionError::index(format.name(), other.to_string()),
            }
        })?;

        let info = backend.info();
        if info.width == 0 || info.height == 0 {
            return Err(RegionError::index(
                format.name(),
                format!("empty image {}x{}", info.width, info.height),
            ));
        }
        // Backstop for backends that don't check limits themselves.
        self.limits.check(info.width, info.height)?;

        log::debug!(
            "indexed {} image {}x{} (alpha: {})",
            format.name(),
            info.width,
            info.height,
            info.has_alpha
        );
        Ok(RegionDecoder {
            backend,
            info,
            limits: self.limits,
        })
    }
}

/// Decodes arbitrary rectangles of one encoded image.
///
/// The stream is parsed and indexed once at construction; every
/// [`decode_region`](RegionDecoder::decode_region) call then reads only the
/// rows its rectangle touches. Decodes take `&self` and carry their settings
/// per call, so one decoder can serve several threads at once.
///
/// ```no_run
/// use zenregion::{DecodeOptions, Rect, RegionDecoder};
///
/// let decoder = RegionDecoder::from_path("large.ppm")?;
/// let mut opts = DecodeOptions::new().with_sample_size(2);
/// let tile = decoder.decode_region(Rect::new(0, 0, 512, 512), Some(&mut opts))?;
/// assert_eq!(opts.out_width, Some(tile.width()));
/// # Ok::<(), zenregion::RegionError>(())
/// ```
pub struct RegionDecoder {
    backend: Box<dyn RegionBackend>,
    info: ImageInfo,
    limits: Limits,
}

impl RegionDecoder {
    /// Build with the built-in backends and no limits.
    pub fn new(source: EncodedSource) -> Result<Self, RegionError> {
        RegionDecoderBuilder::new().build(source)
    }

    pub fn builder() -> RegionDecoderBuilder {
        RegionDecoderBuilder::new()
    }

    /// Copy `length` bytes at `offset` and index them.
    pub fn from_bytes(bytes: &[u8], offset: usize, length: usize) -> Result<Self, RegionError> {
        Self::new(EncodedSource::from_bytes(bytes, offset, length)?)
    }

    pub fn from_file(file: &File) -> Result<Self, RegionError> {
        Self::new(EncodedSource::from_file(file)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        Self::new(EncodedSource::from_path(path)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, RegionError> {
        Self::new(EncodedSource::from_reader(reader)?)
    }

    pub fn from_asset(asset: &mut impl Asset) -> Result<Self, RegionError> {
        Self::new(EncodedSource::from_asset(asset)?)
    }

    /// Full image width.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Full image height.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn format(&self) -> ImageFormat {
        self.info.format
    }

    /// Smallest output layout that loses nothing the source holds.
    pub fn native_layout(&self) -> PixelLayout {
        if self.info.is_gray && !self.info.has_alpha {
            PixelLayout::Gray8
        } else {
            PixelLayout::Rgba8
        }
    }

    /// Decode `rect` (full-image coordinates) with optional settings.
    ///
    /// `None` options mean: sample size 1, RGBA8 premultiplied, dither on,
    /// speed over quality, fresh allocation, no cancellation. When options
    /// are given, their `out_*` fields are cleared on entry and filled in on
    /// success. A failed decode leaves the decoder usable.
    pub fn decode_region(
        &self,
        rect: Rect,
        options: Option<&mut DecodeOptions<'_>>,
    ) -> Result<DecodedRegion, RegionError> {
        let mut defaults = DecodeOptions::default();
        let opts = match options {
            Some(opts) => opts,
            None => &mut defaults,
        };
        opts.clear_outputs();

        let layout = opts
            .preferred_layout
            .or_else(|| opts.reuse.as_ref().map(Bitmap::layout))
            .unwrap_or_default();
        let params = DecodeParams {
            sample_size: opts.sample_size.max(1),
            layout,
            dither: opts.dither,
            prefer_quality_over_speed: opts.prefer_quality_over_speed,
            premultiply: !opts.require_unpremultiplied,
        };

        let guard = CancelGuard::register(opts.cancel.as_ref(), opts.stop);
        // A cancel requested before the guard existed is only visible here.
        if let Err(reason) = guard.precheck() {
            log::debug!("region decode {rect:?} cancelled before start");
            return Err(RegionError::Cancelled(reason));
        }

        let mut target = DecodeTarget::new(opts.reuse.take(), &self.limits);
        let result = self.backend.decode_subset(rect, &params, &mut target, &guard);
        drop(guard);

        let reused = target.is_reused();
        if let Err(e) = result {
            if reused {
                let touched = target.is_touched();
                opts.reuse = target.into_bitmap();
                // A half-written bitmap no longer holds what caches saw.
                if touched {
                    if let Some(bitmap) = opts.reuse.as_mut() {
                        bitmap.notify_pixels_changed();
                    }
                }
            }
            log::warn!("region decode {rect:?} failed: {e}");
            return Err(match e {
                RegionError::Cancelled(reason) => RegionError::Cancelled(reason),
                other => RegionError::DecodeFailed(other.to_string()),
            });
        }

        let mut bitmap = target
            .into_bitmap()
            .ok_or_else(|| RegionError::DecodeFailed("backend produced no output".into()))?;
        bitmap.set_premultiplied(params.premultiply);
        if reused {
            bitmap.notify_pixels_changed();
        }

        opts.out_width = Some(bitmap.width());
        opts.out_height = Some(bitmap.height());
        opts.out_format = Some(self.info.format);

        log::debug!(
            "decoded {rect:?} at 1/{} into {}x{} {:?}{}",
            params.sample_size,
            bitmap.width(),
            bitmap.height(),
            bitmap.layout(),
            if reused { " (reused)" } else { "" }
        );
        Ok(DecodedRegion {
            bitmap,
            format: self.info.format,
            reused,
        })
    }

    /// [`decode_region`](Self::decode_region) with an origin and size.
    pub fn decode_region_xywh(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        options: Option<&mut DecodeOptions<'_>>,
    ) -> Result<DecodedRegion, RegionError> {
        self.decode_region(Rect::from_xywh(x, y, width, height), options)
    }

    /// Release the backend and its index.
    pub fn close(self) {
        log::debug!(
            "closing {} region decoder {}x{}",
            self.info.format.name(),
            self.info.width,
            self.info.height
        );
    }
}

impl std::fmt::Debug for RegionDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionDecoder")
            .field("info", &self.info)
            .field("limits", &self.limits)
            .finish()
    }
}
