//! Run-length emission shared by every body strategy.
//!
//! A run of `len` identical sixel characters is written either literally or
//! with the Graphics Repeat Introducer (`!<len><char>`). Both forms paint the
//! same pixels; the cut-over point is part of the [`RunPolicy`].

use std::io::{self, Write};

/// Lowest sixel data character: no rows lit.
pub const SIXEL_BASE: u8 = 0x3F;

/// Largest plane mask; six rows lit.
pub const SIXEL_MASK_MAX: u8 = 0x3F;

/// How runs are broken and written.
///
/// Each strategy has its own policy; only the alpha threshold one caps runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunPolicy {
    /// Runs shorter than this are written as repeated characters.
    pub literal_below: usize,
    /// Longest run a scanner may accumulate before forcing a break.
    pub max_run: Option<usize>,
}

impl RunPolicy {
    pub const QUALITY: Self = Self {
        literal_below: 4,
        max_run: None,
    };

    pub const FAST: Self = Self {
        literal_below: 3,
        max_run: None,
    };

    pub const ALPHA_THRESHOLD: Self = Self {
        literal_below: 3,
        max_run: Some(255),
    };

    /// Whether a run of `len` may still grow by one column.
    #[inline]
    pub fn can_extend(&self, len: usize) -> bool {
        self.max_run.is_none_or(|max| len < max)
    }
}

/// Sixel data character for a 6-bit plane mask.
#[inline]
pub fn sixel_byte(mask: u8) -> u8 {
    debug_assert!(mask <= SIXEL_MASK_MAX, "sixel mask out of range: {mask:#x}");
    SIXEL_BASE + (mask & SIXEL_MASK_MAX)
}

/// Writes runs of sixel characters according to a [`RunPolicy`].
#[derive(Clone, Copy, Debug)]
pub struct RunEmitter {
    policy: RunPolicy,
}

impl RunEmitter {
    pub fn new(policy: RunPolicy) -> Self {
        Self { policy }
    }

    #[inline]
    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    /// Emit `len` columns painted with `mask`.
    pub fn emit<W: Write>(&self, out: &mut W, mask: u8, len: usize) -> io::Result<()> {
        write_run(out, sixel_byte(mask), len, self.policy.literal_below)
    }
}

/// Emit `len` copies of `byte`, compressed once `len >= literal_below`.
pub fn write_run<W: Write>(out: &mut W, byte: u8, len: usize, literal_below: usize) -> io::Result<()> {
    if len == 0 {
        return Ok(());
    }
    if len < literal_below {
        for _ in 0..len {
            out.write_all(&[byte])?;
        }
    } else {
        out.write_all(b"!")?;
        write_number(out, len)?;
        out.write_all(&[byte])?;
    }
    Ok(())
}

/// Decimal number without going through `fmt`.
#[inline]
pub(crate) fn write_number<W: Write>(out: &mut W, mut n: usize) -> io::Result<()> {
    if n == 0 {
        return out.write_all(b"0");
    }

    let mut buf = [0u8; 20];
    let mut i = buf.len();

    while n > 0 {
        i -= 1;
        buf[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }

    out.write_all(&buf[i..])
}
