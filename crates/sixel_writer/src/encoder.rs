//! SIXEL encoder entry points.
//!
//! An [`IndexedImage`] is written as `DCS header`, body, `ST`, with the body
//! produced by one of three strategies chosen through [`EncodeMode`].

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::body::BodyWriter;
use crate::envelope::{write_header, write_terminator};
use crate::indexed::IndexedImage;
use crate::quantize::quantize_rgba;
use crate::run::RunPolicy;
use crate::{Result, SixelError, SIXEL_PALETTE_MAX};

pub use crate::envelope::BitMode;

/// Body encoding strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodeMode {
    /// Size priority. Each 6-row band is written color by color, so every
    /// color gets one mask row per band.
    #[default]
    Quality,
    /// Speed priority. One pass per image row without buffering a band.
    Fast,
    /// Row by row with pixels below [`EncodeOptions::alpha_threshold`] left
    /// transparent. Needs an alpha channel.
    AlphaThreshold,
}

impl EncodeMode {
    /// Literal cut-over and run cap used by this strategy.
    pub fn run_policy(self) -> RunPolicy {
        match self {
            EncodeMode::Quality => RunPolicy::QUALITY,
            EncodeMode::Fast => RunPolicy::FAST,
            EncodeMode::AlphaThreshold => RunPolicy::ALPHA_THRESHOLD,
        }
    }
}

/// Options for the SIXEL encoder.
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// 7-bit (`ESC P` ... `ESC \`) or 8-bit (`0x90` ... `0x9C`) controls.
    pub bit_mode: BitMode,

    pub mode: EncodeMode,

    /// Maximum number of colors when quantizing RGBA input (1-256).
    /// Values above 256 are treated as 256. Ignored by
    /// [`SixelEncoder::encode`], which writes the palette it is given.
    pub ncolor: u16,

    /// Pixels with alpha below this stay transparent in
    /// [`EncodeMode::AlphaThreshold`].
    pub alpha_threshold: u8,

    /// Treat the color of the top-left pixel as transparent.
    pub chroma_key: bool,

    /// Write only the sixel data, without DCS header and terminator.
    pub body_only: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            bit_mode: BitMode::Seven,
            mode: EncodeMode::Quality,
            ncolor: SIXEL_PALETTE_MAX as u16,
            alpha_threshold: 0,
            chroma_key: false,
            body_only: false,
        }
    }
}

/// Writes [`IndexedImage`]s as SIXEL.
///
/// The encoder itself holds only options and the interrupt flag; all
/// per-image state, including the set of already defined color registers, is
/// created inside each [`encode`](Self::encode) call.
#[derive(Clone, Debug, Default)]
pub struct SixelEncoder {
    options: EncodeOptions,
    interrupt: Option<Arc<AtomicBool>>,
}

impl SixelEncoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            interrupt: None,
        }
    }

    /// Abort with [`SixelError::Interrupted`] once `flag` is set, e.g. from a
    /// SIGINT handler. The flag is checked before every band or row.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode `image` into `out`.
    ///
    /// Input problems are reported before anything is written. A failing sink
    /// or an interrupt aborts the body immediately; when the DCS header is
    /// already out, the string terminator is still attempted so the terminal
    /// leaves sixel mode.
    pub fn encode<W: Write>(&self, image: &IndexedImage, out: &mut W) -> Result<()> {
        let opts = &self.options;
        if opts.mode == EncodeMode::AlphaThreshold && !image.has_alpha() {
            return Err(SixelError::MissingAlpha);
        }
        if self.interrupted() {
            return Err(SixelError::Interrupted);
        }

        let key_color = opts.chroma_key.then(|| image.index_at(0, 0));
        log::debug!(
            "encoding {}x{} image, {} colors, {:?} mode, key color {:?}",
            image.width(),
            image.height(),
            image.palette().len(),
            opts.mode,
            key_color
        );

        if opts.body_only {
            return self.write_body(image, out, key_color);
        }

        write_header(out, opts.bit_mode, opts.chroma_key, image.width(), image.height())?;
        if let Err(e) = self.write_body(image, out, key_color) {
            if let Err(st) = write_terminator(out, opts.bit_mode) {
                log::debug!("could not terminate sixel data after error: {st}");
            }
            return Err(e);
        }
        write_terminator(out, opts.bit_mode)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, image: &IndexedImage, out: &mut W, key_color: Option<u8>) -> Result<()> {
        let opts = &self.options;
        BodyWriter::new(image, out, opts.mode, key_color, opts.alpha_threshold)
            .interrupt(self.interrupt.as_deref())
            .write()
    }

    /// Encode `image` into a new buffer.
    #[must_use = "this returns the encoded SIXEL data"]
    pub fn encode_to_vec(&self, image: &IndexedImage) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(image.width() * image.height() / 2 + 64);
        self.encode(image, &mut out)?;
        log::debug!("encoded {} bytes", out.len());
        Ok(out)
    }
}

/// Encode an indexed image into SIXEL bytes.
///
/// # Example
/// ```ignore
/// use sixel_writer::{sixel_encode, EncodeOptions, IndexedImage, Palette, Rgb};
///
/// let palette = Palette::new(vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)])?;
/// let image = IndexedImage::new(palette, 2, 2, vec![0, 0, 1, 1])?;
/// let opts = EncodeOptions { body_only: true, ..Default::default() };
/// assert_eq!(sixel_encode(&image, &opts)?, b"#0;2;100;0;0@@$#1;2;0;100;0AA$-");
/// ```
#[must_use = "this returns the encoded SIXEL data"]
pub fn sixel_encode(image: &IndexedImage, opts: &EncodeOptions) -> Result<Vec<u8>> {
    SixelEncoder::new(opts.clone()).encode_to_vec(image)
}

/// Quantize RGBA pixel data to at most `opts.ncolor` colors and encode it.
///
/// # Arguments
/// * `rgba` - Raw RGBA pixel data (4 bytes per pixel: R, G, B, A)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `opts` - Encoding options
#[must_use = "this returns the encoded SIXEL data"]
pub fn sixel_encode_rgba(
    rgba: &[u8],
    width: usize,
    height: usize,
    opts: &EncodeOptions,
) -> Result<Vec<u8>> {
    let image = quantize_rgba(rgba, width, height, opts.ncolor)?;
    sixel_encode(&image, opts)
}
