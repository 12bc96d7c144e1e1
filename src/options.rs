use enough::Stop;

use crate::bitmap::Bitmap;
use crate::cancel::CancelSignal;
use crate::pixel::{ImageFormat, PixelLayout};

/// Per-call configuration for [`RegionDecoder::decode_region`](crate::RegionDecoder::decode_region).
///
/// Fields are public so the bundle can be filled in directly; the `with_*`
/// builders cover the common cases. The `out_*` fields are written back by
/// every decode call: cleared on entry, set on success.
///
/// ```no_run
/// use zenregion::{CancelSignal, DecodeOptions, PixelLayout};
///
/// let cancel = CancelSignal::new();
/// let mut opts = DecodeOptions::new()
///     .with_sample_size(4)
///     .with_layout(PixelLayout::Rgb565)
///     .with_cancel(cancel.clone());
/// # let _ = &mut opts;
/// ```
pub struct DecodeOptions<'a> {
    /// Downscale factor. `0` and `1` both mean full resolution.
    pub sample_size: u32,
    /// Output layout. `None` keeps the reused bitmap's layout, or RGBA8.
    pub preferred_layout: Option<PixelLayout>,
    /// Ordered dither when quantizing to [`PixelLayout::Rgb565`].
    pub dither: bool,
    /// Box-filter each sample block instead of point sampling.
    pub prefer_quality_over_speed: bool,
    /// Leave RGBA8 output unpremultiplied.
    pub require_unpremultiplied: bool,
    /// Decode into this bitmap's allocation instead of allocating.
    ///
    /// Moved into the returned region on success, handed back here on failure.
    pub reuse: Option<Bitmap>,
    pub cancel: Option<CancelSignal>,
    /// Extra stop token (deadline, parent job), polled alongside `cancel`.
    pub stop: Option<&'a dyn Stop>,

    /// Decoded width, written back on success.
    pub out_width: Option<u32>,
    /// Decoded height, written back on success.
    pub out_height: Option<u32>,
    /// Detected source format, written back on success.
    pub out_format: Option<ImageFormat>,
}

impl Default for DecodeOptions<'_> {
    fn default() -> Self {
        Self {
            sample_size: 1,
            preferred_layout: None,
            dither: true,
            prefer_quality_over_speed: false,
            require_unpremultiplied: false,
            reuse: None,
            cancel: None,
            stop: None,
            out_width: None,
            out_height: None,
            out_format: None,
        }
    }
}

impl<'a> DecodeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_layout(mut self, layout: PixelLayout) -> Self {
        self.preferred_layout = Some(layout);
        self
    }

    pub fn with_dither(mut self, dither: bool) -> Self {
        self.dither = dither;
        self
    }

    pub fn with_quality_over_speed(mut self, prefer_quality: bool) -> Self {
        self.prefer_quality_over_speed = prefer_quality;
        self
    }

    pub fn with_unpremultiplied(mut self, unpremultiplied: bool) -> Self {
        self.require_unpremultiplied = unpremultiplied;
        self
    }

    pub fn with_reuse(mut self, bitmap: Bitmap) -> Self {
        self.reuse = Some(bitmap);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set an additional cancellation token.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Request cancellation through the attached signal, if any.
    pub fn request_cancel(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelSignal::request_cancel)
    }

    /// MIME type of the detected format, after a successful decode.
    pub fn out_mime_type(&self) -> Option<&'static str> {
        self.out_format.as_ref().map(ImageFormat::mime_type)
    }

    pub(crate) fn clear_outputs(&mut self) {
        self.out_width = None;
        self.out_height = None;
        self.out_format = None;
    }
}

impl std::fmt::Debug for DecodeOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("sample_size", &self.sample_size)
            .field("preferred_layout", &self.preferred_layout)
            .field("dither", &self.dither)
            .field("prefer_quality_over_speed", &self.prefer_quality_over_speed)
            .field("require_unpremultiplied", &self.require_unpremultiplied)
            .field("reuse", &self.reuse.as_ref().map(|b| (b.width(), b.height())))
            .field("cancel", &self.cancel)
            .field("stop", &self.stop.is_some())
            .field("out_width", &self.out_width)
            .field("out_height", &self.out_height)
            .field("out_format", &self.out_format)
            .finish()
    }
}
