//! Sixel body strategies.
//!
//! All three strategies walk the same [`IndexedImage`] and share one
//! [`RunEmitter`]; they differ in how pixels are grouped into runs:
//!
//! - banded: every color of a 6-row band gets a full mask row of its own
//! - rows: one pass per image row, the row's plane bit as the mask
//! - alpha rows: like rows, with transparency and a capped run length

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::encoder::EncodeMode;
use crate::indexed::IndexedImage;
use crate::run::{write_number, RunEmitter};
use crate::{Result, SixelError, SIXEL_BAND_HEIGHT, SIXEL_PALETTE_MAX};

// Plane bit of the sixth row of a band.
const LAST_PLANE: u8 = 1 << (SIXEL_BAND_HEIGHT - 1);

/// Color registers already defined in the current encode call.
#[derive(Clone, Debug)]
pub(crate) struct PaletteEmittedSet {
    emitted: [bool; SIXEL_PALETTE_MAX],
}

impl PaletteEmittedSet {
    pub(crate) fn new() -> Self {
        Self {
            emitted: [false; SIXEL_PALETTE_MAX],
        }
    }

    /// Marks `index` as defined. Returns `true` the first time only.
    #[inline]
    pub(crate) fn insert(&mut self, index: u8) -> bool {
        !std::mem::replace(&mut self.emitted[index as usize], true)
    }
}

/// State of one body encode. Built fresh for every call and never shared.
pub(crate) struct BodyWriter<'a, W: Write> {
    image: &'a IndexedImage,
    out: &'a mut W,
    mode: EncodeMode,
    emitter: RunEmitter,
    key_color: Option<u8>,
    alpha_threshold: u8,
    emitted: PaletteEmittedSet,
    interrupt: Option<&'a AtomicBool>,
}

impl<'a, W: Write> BodyWriter<'a, W> {
    pub(crate) fn new(
        image: &'a IndexedImage,
        out: &'a mut W,
        mode: EncodeMode,
        key_color: Option<u8>,
        alpha_threshold: u8,
    ) -> Self {
        Self {
            image,
            out,
            mode,
            emitter: RunEmitter::new(mode.run_policy()),
            key_color,
            alpha_threshold,
            emitted: PaletteEmittedSet::new(),
            interrupt: None,
        }
    }

    /// Stop with [`SixelError::Interrupted`] at the next band or row boundary
    /// once `flag` is set.
    pub(crate) fn interrupt(mut self, flag: Option<&'a AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    fn check_interrupt(&self) -> Result<()> {
        match self.interrupt {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(SixelError::Interrupted),
            _ => Ok(()),
        }
    }

    pub(crate) fn write(mut self) -> Result<()> {
        match self.mode {
            EncodeMode::Quality => self.write_banded(),
            EncodeMode::Fast => self.write_rows(),
            EncodeMode::AlphaThreshold => self.write_alpha_rows(),
        }
    }

    /// `#n;2;r;g;b`. Defining a register also selects it.
    fn define_color(&mut self, index: u8) -> Result<()> {
        let [r, g, b] = self.image.palette().color(index).percent();
        self.out.write_all(b"#")?;
        write_number(self.out, index as usize)?;
        self.out.write_all(b";2;")?;
        write_number(self.out, r as usize)?;
        self.out.write_all(b";")?;
        write_number(self.out, g as usize)?;
        self.out.write_all(b";")?;
        write_number(self.out, b as usize)?;
        Ok(())
    }

    /// Selects a register, defining it on first use.
    fn select_color(&mut self, index: u8) -> Result<()> {
        if self.emitted.insert(index) {
            return self.define_color(index);
        }
        self.out.write_all(b"#")?;
        write_number(self.out, index as usize)?;
        Ok(())
    }

    fn write_banded(&mut self) -> Result<()> {
        let image = self.image;
        let width = image.width();
        let height = image.height();

        let mut masks: Vec<u8> = Vec::with_capacity(width);
        let mut work: VecDeque<(u8, usize)> = VecDeque::new();

        for top in (0..height).step_by(SIXEL_BAND_HEIGHT) {
            self.check_interrupt()?;
            let rows = (height - top).min(SIXEL_BAND_HEIGHT);
            let band: Vec<&[u8]> = (top..top + rows).map(|y| image.row(y)).collect();

            let mut visited = [false; SIXEL_PALETTE_MAX];
            let seed = band[0][0];
            visited[seed as usize] = true;
            work.push_back((seed, 0));

            let mut colors = 0usize;
            while let Some((color, start)) = work.pop_front() {
                masks.clear();
                for x in start..width {
                    let mut mask = 0u8;
                    for (bit, row) in band.iter().enumerate() {
                        let index = row[x];
                        if index == color {
                            mask |= 1 << bit;
                        } else if !visited[index as usize] {
                            visited[index as usize] = true;
                            work.push_back((index, x));
                        }
                    }
                    masks.push(mask);
                }

                if self.key_color == Some(color) {
                    continue;
                }
                colors += 1;
                self.select_color(color)?;
                self.write_masks(start, &masks)?;
                self.out.write_all(b"$")?;
            }
            log::trace!("band at row {top}: {rows} rows, {colors} colors");

            self.out.write_all(b"-")?;
        }
        Ok(())
    }

    /// Run-length encode one color's masks. Columns before `start` are empty.
    fn write_masks(&mut self, start: usize, masks: &[u8]) -> Result<()> {
        let mut current = 0u8;
        let mut len = start;
        for &mask in masks {
            if mask == current {
                len += 1;
            } else {
                self.emitter.emit(self.out, current, len)?;
                current = mask;
                len = 1;
            }
        }
        // A trailing empty run paints nothing; `$` returns to the band start.
        if current != 0 {
            self.emitter.emit(self.out, current, len)?;
        }
        Ok(())
    }

    fn write_rows(&mut self) -> Result<()> {
        let image = self.image;
        let mut plane = 1u8;

        for y in 0..image.height() {
            self.check_interrupt()?;
            let row = image.row(y);
            let mut x = 0;
            while x < row.len() {
                let color = row[x];
                let mut len = 1;
                while x + len < row.len() && row[x + len] == color {
                    len += 1;
                }

                if self.key_color == Some(color) {
                    self.emitter.emit(self.out, 0, len)?;
                } else {
                    self.select_color(color)?;
                    self.emitter.emit(self.out, plane, len)?;
                }
                x += len;
            }

            if plane == LAST_PLANE {
                plane = 1;
                self.out.write_all(b"-")?;
            } else {
                plane <<= 1;
                self.out.write_all(b"$")?;
            }
        }
        Ok(())
    }

    fn write_alpha_rows(&mut self) -> Result<()> {
        let image = self.image;
        if !image.has_alpha() {
            return Err(SixelError::MissingAlpha);
        }
        let policy = self.emitter.policy();
        let width = image.width();
        let mut plane = 1u8;

        for y in 0..image.height() {
            self.check_interrupt()?;
            let row = image.row(y);
            let alpha_row = image.alpha_row(y).ok_or(SixelError::MissingAlpha)?;
            let mut x = 0;
            while x < width {
                let color = row[x];
                let a = alpha_row[x];
                let mut len = 1;
                while x + len < width
                    && row[x + len] == color
                    && alpha_row[x + len] == a
                    && policy.can_extend(len)
                {
                    len += 1;
                }

                let transparent = self.key_color == Some(color) || a < self.alpha_threshold;
                let mask = if transparent { 0 } else { plane };
                self.define_color(color)?;
                self.emitter.emit(self.out, mask, len)?;
                x += len;
            }

            self.out.write_all(b"$")?;
            if plane == LAST_PLANE {
                plane = 1;
                self.out.write_all(b"-")?;
            } else {
                plane <<= 1;
            }
        }
        Ok(())
    }
}
