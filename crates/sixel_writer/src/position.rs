//! Cursor handling around a drawn image.
//!
//! The cursor is saved (DECSC), optionally moved, the image is written and the
//! cursor is restored (DECRC), so the terminal prompt comes back where it was.
//! Nothing of this is written when the output is not a terminal or when only
//! the sixel body is requested.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::encoder::{EncodeOptions, SixelEncoder};
use crate::envelope::BitMode;
use crate::indexed::IndexedImage;
use crate::run::write_number;
use crate::Result;

const SAVE_CURSOR: &[u8] = b"\x1b7";
const RESTORE_CURSOR: &[u8] = b"\x1b8";

/// Where to draw, in character cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    /// Treat `x`/`y` as absolute positions instead of offsets from the cursor.
    pub absolute: bool,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

/// Draws images with cursor save/restore and positioning.
#[derive(Clone, Debug, Default)]
pub struct SixelWriter {
    encoder: SixelEncoder,
}

impl SixelWriter {
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            encoder: SixelEncoder::new(options),
        }
    }

    /// See [`SixelEncoder::with_interrupt`].
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.encoder = self.encoder.with_interrupt(flag);
        self
    }

    #[inline]
    pub fn options(&self) -> &EncodeOptions {
        self.encoder.options()
    }

    /// Draw `image` at `placement`.
    ///
    /// `interactive` tells whether `out` is a terminal. Once the cursor was
    /// saved it is restored again, also when encoding fails or is interrupted.
    /// The restore always follows the string terminator of an aborted image.
    pub fn draw<W: Write>(
        &self,
        out: &mut W,
        image: &IndexedImage,
        placement: &Placement,
        interactive: bool,
    ) -> Result<()> {
        let positioned = interactive && !self.options().body_only;
        if !positioned {
            return self.encoder.encode(image, out);
        }

        out.write_all(SAVE_CURSOR)?;
        let drawn = self.move_and_encode(out, image, placement);
        let restored = out.write_all(RESTORE_CURSOR);
        if drawn.is_err() {
            log::debug!("restored cursor after failed draw");
        }
        drawn?;
        restored?;
        Ok(())
    }

    fn move_and_encode<W: Write>(&self, out: &mut W, image: &IndexedImage, placement: &Placement) -> Result<()> {
        let bit_mode = self.options().bit_mode;
        if let Some(x) = placement.x {
            move_x(out, bit_mode, x, placement.absolute)?;
        }
        if let Some(y) = placement.y {
            move_y(out, bit_mode, y, placement.absolute)?;
        }
        self.encoder.encode(image, out)
    }
}

/// Horizontal move: HPA when absolute, else CUF (`C`) or CUB (`D`).
pub fn move_x<W: Write>(out: &mut W, bit_mode: BitMode, n: i32, absolute: bool) -> std::io::Result<()> {
    write_move(out, bit_mode, n, absolute, b'`', b'C', b'D')
}

/// Vertical move: VPA (`d`) when absolute, else CUD (`B`) or CUU (`A`).
pub fn move_y<W: Write>(out: &mut W, bit_mode: BitMode, n: i32, absolute: bool) -> std::io::Result<()> {
    write_move(out, bit_mode, n, absolute, b'd', b'B', b'A')
}

fn write_move<W: Write>(
    out: &mut W,
    bit_mode: BitMode,
    n: i32,
    absolute: bool,
    absolute_final: u8,
    forward_final: u8,
    backward_final: u8,
) -> std::io::Result<()> {
    let (count, final_byte) = if absolute {
        (n.max(0) as usize, absolute_final)
    } else if n > 0 {
        (n as usize, forward_final)
    } else if n < 0 {
        (n.unsigned_abs() as usize, backward_final)
    } else {
        return Ok(());
    };

    out.write_all(bit_mode.csi())?;
    write_number(out, count)?;
    out.write_all(&[final_byte])
}
