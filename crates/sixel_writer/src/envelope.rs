//! DCS envelope around the sixel body.
//!
//! ```text
//! DCS 7 ; Pb ; 75 q " 1 ; 1 ; W ; H  <body>  ST
//! ```
//!
//! `Pb` is 1 normally and 2 when a chroma key is in use. The aspect ratio 7
//! means square pixels and 75 is a dummy grid size kept for old printers.

use std::io::{self, Write};

use crate::run::write_number;

const DCS_7BIT: &[u8] = b"\x1bP";
const DCS_8BIT: &[u8] = b"\x90";
const ST_7BIT: &[u8] = b"\x1b\\";
const ST_8BIT: &[u8] = b"\x9c";
const CSI_7BIT: &[u8] = b"\x1b[";
const CSI_8BIT: &[u8] = b"\x9b";

const ASPECT_RATIO_SQUARE: usize = 7;
const BACKGROUND_DEFAULT: usize = 1;
const BACKGROUND_KEYED: usize = 2;
const DUMMY_DPI: usize = 75;

/// Whether C1 controls are sent as 7-bit escape pairs or single 8-bit bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BitMode {
    #[default]
    Seven,
    Eight,
}

impl BitMode {
    /// Device Control String introducer.
    #[inline]
    pub fn dcs(self) -> &'static [u8] {
        match self {
            BitMode::Seven => DCS_7BIT,
            BitMode::Eight => DCS_8BIT,
        }
    }

    /// String Terminator.
    #[inline]
    pub fn st(self) -> &'static [u8] {
        match self {
            BitMode::Seven => ST_7BIT,
            BitMode::Eight => ST_8BIT,
        }
    }

    /// Control Sequence Introducer.
    #[inline]
    pub fn csi(self) -> &'static [u8] {
        match self {
            BitMode::Seven => CSI_7BIT,
            BitMode::Eight => CSI_8BIT,
        }
    }
}

/// DCS introducer, sixel parameters and raster attributes.
pub fn write_header<W: Write>(
    out: &mut W,
    bit_mode: BitMode,
    chroma_key: bool,
    width: usize,
    height: usize,
) -> io::Result<()> {
    let background = if chroma_key {
        BACKGROUND_KEYED
    } else {
        BACKGROUND_DEFAULT
    };

    out.write_all(bit_mode.dcs())?;
    write_number(out, ASPECT_RATIO_SQUARE)?;
    out.write_all(b";")?;
    write_number(out, background)?;
    out.write_all(b";")?;
    write_number(out, DUMMY_DPI)?;
    out.write_all(b"q\"1;1;")?;
    write_number(out, width)?;
    out.write_all(b";")?;
    write_number(out, height)
}

#[inline]
pub fn write_terminator<W: Write>(out: &mut W, bit_mode: BitMode) -> io::Result<()> {
    out.write_all(bit_mode.st())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_7bit() {
        let mut out = Vec::new();
        write_header(&mut out, BitMode::Seven, false, 640, 480).unwrap();
        assert_eq!(out, b"\x1bP7;1;75q\"1;1;640;480");
    }

    #[test]
    fn test_header_8bit_keyed() {
        let mut out = Vec::new();
        write_header(&mut out, BitMode::Eight, true, 2, 3).unwrap();
        assert_eq!(out, b"\x907;2;75q\"1;1;2;3");
    }

    #[test]
    fn test_terminators() {
        let mut out = Vec::new();
        write_terminator(&mut out, BitMode::Seven).unwrap();
        write_terminator(&mut out, BitMode::Eight).unwrap();
        assert_eq!(out, b"\x1b\\\x9c");
    }
}
