use crate::error::RegionError;
use crate::pixel::PixelLayout;

/// An owned, tightly packed pixel buffer produced by a region decode.
///
/// A bitmap can be handed back through
/// [`DecodeOptions::reuse`](crate::DecodeOptions) to decode into its existing
/// allocation. Every decode that writes into a bitmap bumps its
/// [`generation_id`](Bitmap::generation_id), so caches keyed on it invalidate.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    premultiplied: bool,
    generation: u64,
}

impl Bitmap {
    /// Allocate a zeroed bitmap.
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Result<Self, RegionError> {
        let len = layout.buffer_len(width, height).ok_or_else(|| {
            RegionError::LimitExceeded(format!("bitmap {width}x{height} overflows"))
        })?;
        Ok(Self {
            pixels: vec![0; len],
            width,
            height,
            layout,
            premultiplied: layout.supports_premultiplied(),
            generation: 0,
        })
    }

    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Whether color channels are scaled by alpha.
    ///
    /// Always `false` for layouts without both color and alpha.
    pub fn is_premultiplied(&self) -> bool {
        self.premultiplied
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// One row of pixel data, or `None` if `y` is out of range.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.row_bytes();
        let start = y as usize * stride;
        self.pixels.get(start..start + stride)
    }

    /// Bytes of one pixel, or `None` if out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let start = x as usize * bpp;
        self.row(y)?.get(start..start + bpp)
    }

    /// Bytes the current allocation can hold without growing.
    pub fn capacity_bytes(&self) -> usize {
        self.pixels.capacity()
    }

    /// Changes every time the pixel content is rewritten.
    pub fn generation_id(&self) -> u64 {
        self.generation
    }

    /// Mark the content as changed so dependent caches invalidate.
    pub fn notify_pixels_changed(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Reshape to new dimensions inside the existing allocation.
    ///
    /// Returns `false`, leaving the bitmap untouched, when the allocation
    /// is too small.
    pub(crate) fn reconfigure(&mut self, width: u32, height: u32, layout: PixelLayout) -> bool {
        let Some(len) = layout.buffer_len(width, height) else {
            return false;
        };
        if len > self.pixels.capacity() {
            return false;
        }
        self.pixels.clear();
        self.pixels.resize(len, 0);
        self.width = width;
        self.height = height;
        self.layout = layout;
        true
    }

    pub(crate) fn set_premultiplied(&mut self, premultiplied: bool) {
        self.premultiplied = premultiplied && self.layout.supports_premultiplied();
    }
}
