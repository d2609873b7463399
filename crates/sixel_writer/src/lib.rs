//! # sixel_writer
//!
//! Draw full color bitmaps on terminals that speak the SIXEL graphics protocol.
//!
//! ## Features
//!
//! - **Encoder**: three body strategies over an indexed pixel grid
//!   (size priority banded, speed priority row-by-row, and alpha threshold)
//! - **Quantizer**: RGBA to palette + indices using quantette
//! - **Writer**: cursor save/restore and positioning around the image
//!
//! ## Quick Start
//!
//! ```ignore
//! use sixel_writer::{sixel_encode, EncodeOptions, IndexedImage, Palette, Rgb};
//!
//! let palette = Palette::new(vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)])?;
//! let image = IndexedImage::new(palette, 2, 2, vec![0, 0, 1, 1])?;
//! let sixel = sixel_encode(&image, &EncodeOptions::default())?;
//! std::io::Write::write_all(&mut std::io::stdout(), &sixel)?;
//! ```
//!
//! ### Encoding RGBA data
//!
//! ```ignore
//! use sixel_writer::{sixel_encode_rgba, EncodeOptions};
//!
//! let rgba = vec![255u8, 0, 0, 255, 0, 255, 0, 255];
//! let sixel = sixel_encode_rgba(&rgba, 2, 1, &EncodeOptions::default())?;
//! ```

use thiserror::Error;

mod body;
pub mod encoder;
pub mod envelope;
pub mod indexed;
pub mod position;
pub mod quantize;
pub mod run;

pub use encoder::{sixel_encode, sixel_encode_rgba, BitMode, EncodeMode, EncodeOptions, SixelEncoder};
pub use indexed::{IndexedImage, Palette, Rgb};
pub use position::{Placement, SixelWriter};
pub use quantize::quantize_rgba;

/// Errors that can occur while preparing or encoding a SIXEL image.
#[derive(Debug, Error)]
pub enum SixelError {
    /// Invalid image dimensions (width or height is zero or too large)
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Buffer size doesn't match expected size for dimensions
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// More palette entries than SIXEL color registers
    #[error("palette has {0} colors, at most 256 are supported")]
    PaletteTooLarge(usize),

    /// A palette needs at least one entry
    #[error("palette is empty")]
    EmptyPalette,

    /// A pixel refers to a color the palette doesn't have
    #[error("pixel ({x}, {y}) uses color {index} but the palette has {palette_len} entries")]
    IndexOutOfRange {
        index: u8,
        x: usize,
        y: usize,
        palette_len: usize,
    },

    /// Alpha grid dimensions don't match the pixel grid
    #[error("alpha grid has {actual} values, expected {expected}")]
    AlphaSizeMismatch { expected: usize, actual: usize },

    /// Alpha threshold mode was requested for an image without alpha
    #[error("alpha threshold mode requires an alpha channel")]
    MissingAlpha,

    /// Color quantization failed
    #[error("quantization error: {0}")]
    Quantization(String),

    /// The caller raised the interrupt flag while the image was being written
    #[error("interrupted while writing SIXEL data")]
    Interrupted,

    /// The output sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SIXEL operations.
pub type Result<T> = core::result::Result<T, SixelError>;

/// Number of SIXEL color registers addressable by one image.
pub const SIXEL_PALETTE_MAX: usize = 256;

// Rows packed into one sixel character.
pub(crate) const SIXEL_BAND_HEIGHT: usize = 6;
pub(crate) const SIXEL_WIDTH_LIMIT: usize = 1000000;
pub(crate) const SIXEL_HEIGHT_LIMIT: usize = 1000000;
