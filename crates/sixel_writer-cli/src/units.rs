//! Position and size arguments given in character cells or pixels.

use crate::cellsize::CellSize;

/// A length from the command line: plain numbers are cells, `px` means pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Length {
    Cells(i32),
    Pixels(i32),
}

pub fn parse_length(value: &str) -> Result<Length, String> {
    let value = value.trim();
    let (number, pixels) = match value.strip_suffix("px") {
        Some(number) => (number, true),
        None => (value, false),
    };
    let n: i32 = number
        .trim()
        .parse()
        .map_err(|_| format!("expected a number of cells or pixels like `12` or `40px`, got `{value}`"))?;
    Ok(if pixels {
        Length::Pixels(n)
    } else {
        Length::Cells(n)
    })
}

impl Length {
    /// Horizontal offset in cells.
    pub fn columns(self, cell: CellSize) -> i32 {
        match self {
            Length::Cells(n) => n,
            Length::Pixels(px) => px / cell.width as i32,
        }
    }

    /// Vertical offset in cells.
    pub fn rows(self, cell: CellSize) -> i32 {
        match self {
            Length::Cells(n) => n,
            Length::Pixels(px) => px / cell.height as i32,
        }
    }

    /// Image width in pixels.
    pub fn width_px(self, cell: CellSize) -> i32 {
        match self {
            Length::Cells(n) => n.saturating_mul(cell.width as i32),
            Length::Pixels(px) => px,
        }
    }

    /// Image height in pixels.
    pub fn height_px(self, cell: CellSize) -> i32 {
        match self {
            Length::Cells(n) => n.saturating_mul(cell.height as i32),
            Length::Pixels(px) => px,
        }
    }
}
