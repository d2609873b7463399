//! Indexed image model: palette, per-pixel color indices and optional alpha.
//!
//! Everything is validated on construction, so an [`IndexedImage`] handed to
//! the encoder can always be encoded without touching out-of-range data.

use crate::{Result, SixelError, SIXEL_HEIGHT_LIMIT, SIXEL_PALETTE_MAX, SIXEL_WIDTH_LIMIT};

/// Color type for palette entries (RGB, 0-255 per channel).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as SIXEL RGB percentages (0-100), truncating.
    #[inline]
    pub fn percent(&self) -> [u8; 3] {
        [to_percent(self.r), to_percent(self.g), to_percent(self.b)]
    }
}

#[inline]
fn to_percent(channel: u8) -> u8 {
    (channel as u32 * 100 / 255) as u8
}

/// An ordered list of at most 256 colors. The position of a color is its
/// SIXEL color register number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        if colors.is_empty() {
            return Err(SixelError::EmptyPalette);
        }
        if colors.len() > SIXEL_PALETTE_MAX {
            return Err(SixelError::PaletteTooLarge(colors.len()));
        }
        Ok(Self { colors })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(index as usize).copied()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    // Validated images only hold in-range indices.
    #[inline]
    pub(crate) fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }
}

/// A decoded image reduced to a palette and one color index per pixel.
#[derive(Clone, Debug)]
pub struct IndexedImage {
    palette: Palette,
    width: usize,
    height: usize,
    indices: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl IndexedImage {
    /// Build an image from row-major color indices.
    ///
    /// Fails if a dimension is zero, the buffer is not `width * height` long
    /// or any index points past the end of the palette.
    pub fn new(palette: Palette, width: usize, height: usize, indices: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || width > SIXEL_WIDTH_LIMIT || height > SIXEL_HEIGHT_LIMIT {
            return Err(SixelError::InvalidDimensions { width, height });
        }
        let expected = width * height;
        if indices.len() != expected {
            return Err(SixelError::BufferSizeMismatch {
                expected,
                actual: indices.len(),
            });
        }
        let palette_len = palette.len();
        if let Some(pos) = indices.iter().position(|&i| i as usize >= palette_len) {
            return Err(SixelError::IndexOutOfRange {
                index: indices[pos],
                x: pos % width,
                y: pos / width,
                palette_len,
            });
        }

        Ok(Self {
            palette,
            width,
            height,
            indices,
            alpha: None,
        })
    }

    /// Attach a row-major alpha channel with the same dimensions.
    pub fn with_alpha(mut self, alpha: Vec<u8>) -> Result<Self> {
        let expected = self.width * self.height;
        if alpha.len() != expected {
            return Err(SixelError::AlphaSizeMismatch {
                expected,
                actual: alpha.len(),
            });
        }
        self.alpha = Some(alpha);
        Ok(self)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    #[inline]
    pub fn alpha(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }

    /// One row of color indices.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.indices[start..start + self.width]
    }

    /// One row of alpha values, if the image carries alpha.
    #[inline]
    pub fn alpha_row(&self, y: usize) -> Option<&[u8]> {
        let start = y * self.width;
        self.alpha.as_ref().map(|a| &a[start..start + self.width])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_colors() -> Palette {
        Palette::new(vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]).unwrap()
    }

    #[test]
    fn test_percent_conversion() {
        assert_eq!(Rgb::new(255, 0, 128).percent(), [100, 0, 50]);
        assert_eq!(Rgb::new(1, 2, 3).percent(), [0, 0, 1]);
    }

    #[test]
    fn test_palette_limits() {
        assert!(matches!(Palette::new(vec![]), Err(SixelError::EmptyPalette)));
        assert!(Palette::new(vec![Rgb::default(); 256]).is_ok());
        assert!(matches!(
            Palette::new(vec![Rgb::default(); 257]),
            Err(SixelError::PaletteTooLarge(257))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = IndexedImage::new(two_colors(), 2, 2, vec![0, 1, 1, 2]).unwrap_err();
        match err {
            SixelError::IndexOutOfRange { index, x, y, palette_len } => {
                assert_eq!((index, x, y, palette_len), (2, 1, 1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(IndexedImage::new(two_colors(), 0, 2, vec![]).is_err());
        assert!(IndexedImage::new(two_colors(), 2, 0, vec![]).is_err());
        assert!(matches!(
            IndexedImage::new(two_colors(), 2, 2, vec![0; 3]),
            Err(SixelError::BufferSizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_alpha_must_match() {
        let image = IndexedImage::new(two_colors(), 2, 1, vec![0, 1]).unwrap();
        assert!(matches!(
            image.clone().with_alpha(vec![255]),
            Err(SixelError::AlphaSizeMismatch { expected: 2, actual: 1 })
        ));
        let image = image.with_alpha(vec![0, 255]).unwrap();
        assert_eq!(image.alpha_row(0), Some(&[0u8, 255][..]));
    }

    #[test]
    fn test_rows() {
        let image = IndexedImage::new(two_colors(), 3, 2, vec![0, 0, 1, 1, 1, 0]).unwrap();
        assert_eq!(image.row(1), &[1, 1, 0]);
        assert_eq!(image.index_at(2, 0), 1);
        assert_eq!(image.alpha_row(0), None);
    }
}
