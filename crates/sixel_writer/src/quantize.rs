//! RGBA to indexed conversion using quantette.
//!
//! Wu's quantizer with Floyd-Steinberg dithering reduces the image to at most
//! `ncolor` colors. The alpha channel is carried over unchanged so the alpha
//! threshold strategy can use it.

use crate::indexed::{IndexedImage, Palette, Rgb};
use crate::{Result, SixelError, SIXEL_PALETTE_MAX};
use quantette::{
    deps::palette::Srgb, dither::FloydSteinberg, ImageRef, PaletteSize, Pipeline, QuantizeMethod,
};

/// Quantize RGBA data (4 bytes per pixel) into an [`IndexedImage`] with alpha.
pub fn quantize_rgba(rgba: &[u8], width: usize, height: usize, ncolor: u16) -> Result<IndexedImage> {
    if width == 0 || height == 0 {
        return Err(SixelError::InvalidDimensions { width, height });
    }
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(SixelError::BufferSizeMismatch {
            expected,
            actual: rgba.len(),
        });
    }

    let rgb_pixels: Vec<Srgb<u8>> = rgba
        .chunks_exact(4)
        .map(|c| Srgb::new(c[0], c[1], c[2]))
        .collect();
    let alpha: Vec<u8> = rgba.chunks_exact(4).map(|c| c[3]).collect();

    let palette_size = palette_size(ncolor);
    let image = ImageRef::new(width as u32, height as u32, &rgb_pixels)
        .map_err(|e| SixelError::Quantization(e.to_string()))?;

    let indexed_image = Pipeline::new()
        .palette_size(palette_size)
        .quantize_method(QuantizeMethod::Wu)
        .ditherer(FloydSteinberg::new())
        .input_image(image)
        .output_srgb8_indexed_image();

    let colors: Vec<Rgb> = indexed_image
        .palette()
        .iter()
        .map(|c| Rgb::new(c.red, c.green, c.blue))
        .collect();
    let indices: Vec<u8> = indexed_image.indices().to_vec();
    log::debug!(
        "quantized {}x{} to {} colors (requested {})",
        width,
        height,
        colors.len(),
        ncolor
    );

    IndexedImage::new(Palette::new(colors)?, width, height, indices)?.with_alpha(alpha)
}

fn palette_size(ncolor: u16) -> PaletteSize {
    if ncolor as usize >= SIXEL_PALETTE_MAX {
        return PaletteSize::MAX;
    }
    PaletteSize::try_from(ncolor.max(1) as u8).unwrap_or(PaletteSize::MAX)
}
