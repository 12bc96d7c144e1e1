//! # zenregion
//!
//! Random-access region decoding for large encoded images.
//!
//! A [`RegionDecoder`] parses and indexes an encoded stream once, then decodes
//! any rectangle of it, optionally downsampled, without decoding the rest of
//! the image. Settings travel per call in [`DecodeOptions`], so one decoder
//! can serve several threads, and each call can be cancelled from another
//! thread through a [`CancelSignal`] or any [`Stop`] implementation.
//!
//! ## Supported Formats
//!
//! ### PNM family (`pnm` feature)
//! - **P5** (PGM binary) and **P6** (PPM binary), 8-bit and 16-bit
//! - **P7** (PAM) with 1 to 4 channels
//!
//! ### BMP (`bmp` feature)
//! - Uncompressed 1/2/4/8-bit palettized, 16, 24 and 32-bit
//! - `BI_BITFIELDS` 16/32-bit, with alpha mask
//! - RLE streams are rejected: they have no fixed row positions
//!
//! ### Farbfeld (`farbfeld` feature)
//! - 16-bit RGBA, narrowed to 8-bit
//!
//! Other formats plug in through [`BackendFactory`] and [`Backends`].
//!
//! ## Output
//!
//! Regions decode into a [`Bitmap`] in one of the [`PixelLayout`]s. RGBA
//! output is premultiplied unless [`DecodeOptions::require_unpremultiplied`]
//! is set. A sample size of `n` yields `max(1, floor(extent / n))` pixels per
//! axis.
//!
//! ## Non-Goals
//!
//! - Encoding
//! - Color management
//! - Animated formats
//!
//! ## Usage
//!
//! ```no_run
//! use zenregion::{CancelSignal, DecodeOptions, PixelLayout, Rect, RegionDecoder};
//!
//! let data: Vec<u8> = std::fs::read("scan.ppm")?;
//! let decoder = RegionDecoder::from_bytes(&data, 0, data.len())?;
//! println!("{}x{} {:?}", decoder.width(), decoder.height(), decoder.format());
//!
//! let cancel = CancelSignal::new();
//! let mut opts = DecodeOptions::new()
//!     .with_sample_size(4)
//!     .with_layout(PixelLayout::Rgb565)
//!     .with_cancel(cancel.clone());
//! let region = decoder.decode_region(Rect::new(0, 0, 2048, 2048), Some(&mut opts))?;
//! assert_eq!(opts.out_width, Some(region.width()));
//!
//! // Decode the next tile into the same allocation.
//! opts.reuse = Some(region.bitmap);
//! let next = decoder.decode_region(Rect::new(2048, 0, 4096, 2048), Some(&mut opts))?;
//! assert!(next.reused);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Credits
//!
//! The BMP header and bitfield handling draw from
//! [zune-bmp](https://github.com/etemesi254/zune-image) by Caleb Etemesi
//! (MIT/Apache-2.0/Zlib licensed).

#![forbid(unsafe_code)]

mod backend;
mod bitmap;
mod cancel;
mod decoder;
mod error;
mod limits;
mod options;
mod pixel;
mod rect;
mod sample;
mod source;

#[cfg(feature = "pnm")]
mod pnm;

#[cfg(feature = "bmp")]
mod bmp;

#[cfg(feature = "farbfeld")]
mod farbfeld;

// Re-exports
pub use backend::{
    BackendFactory, Backends, BuiltinBackend, DecodeParams, DecodeTarget, RegionBackend,
};
pub use bitmap::Bitmap;
pub use cancel::CancelSignal;
pub use decoder::{DecodedRegion, RegionDecoder, RegionDecoderBuilder};
pub use enough::{Stop, StopReason};
pub use error::RegionError;
pub use limits::Limits;
pub use options::DecodeOptions;
pub use pixel::{ImageFormat, ImageInfo, PixelLayout};
pub use rect::{PixelRect, Rect, sampled_extent};
pub use source::{Asset, EncodedSource};
