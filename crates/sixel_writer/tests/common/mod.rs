//! Minimal SIXEL parser that records color register numbers instead of RGB,
//! so encoded output can be compared against the original indices.

#![allow(dead_code)]

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Decoded {
    /// Raster attributes `"Pan;Pad;Ph;Pv`, if present.
    pub raster: Option<(usize, usize)>,
    /// DCS parameters before `q`.
    pub params: Vec<usize>,
    /// Every register definition in stream order.
    pub definitions: Vec<(usize, [usize; 3])>,
    /// Painted pixels, indexed `[y][x]`.
    pub pixels: Vec<Vec<Option<usize>>>,
}

impl Decoded {
    pub fn at(&self, x: usize, y: usize) -> Option<usize> {
        self.pixels.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    pub fn definitions_by_register(&self) -> HashMap<usize, usize> {
        let mut counts = HashMap::new();
        for (register, _) in &self.definitions {
            *counts.entry(*register).or_insert(0) += 1;
        }
        counts
    }

    /// Number of rows that received at least one lit pixel.
    pub fn painted_rows(&self) -> usize {
        self.pixels
            .iter()
            .rposition(|row| row.iter().any(Option::is_some))
            .map_or(0, |y| y + 1)
    }

    fn paint(&mut self, x: usize, y: usize, color: usize) {
        if self.pixels.len() <= y {
            self.pixels.resize(y + 1, Vec::new());
        }
        let row = &mut self.pixels[y];
        if row.len() <= x {
            row.resize(x + 1, None);
        }
        row[x] = Some(color);
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn number(&mut self) -> usize {
        let mut n = 0usize;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            n = n * 10 + (b - b'0') as usize;
            self.pos += 1;
        }
        n
    }

    fn numbers(&mut self) -> Vec<usize> {
        let mut values = vec![self.number()];
        while self.peek() == Some(b';') {
            self.pos += 1;
            values.push(self.number());
        }
        values
    }
}

/// Decode a full DCS sequence (7-bit or 8-bit) or a bare sixel body.
pub fn decode(data: &[u8]) -> Decoded {
    let mut decoded = Decoded::default();
    let mut cur = Cursor { data, pos: 0 };

    if data.starts_with(b"\x1bP") || data.first() == Some(&0x90) {
        cur.pos = if data[0] == 0x90 { 1 } else { 2 };
        decoded.params = cur.numbers();
        assert_eq!(cur.peek(), Some(b'q'), "missing sixel introducer");
        cur.pos += 1;
    }

    let mut color = 0usize;
    let mut x = 0usize;
    let mut band = 0usize;

    while let Some(b) = cur.peek() {
        cur.pos += 1;
        match b {
            b'"' => {
                let v = cur.numbers();
                decoded.raster = Some((v[2], v[3]));
            }
            b'#' => {
                let v = cur.numbers();
                color = v[0];
                if v.len() == 5 {
                    assert_eq!(v[1], 2, "only RGB definitions are expected");
                    decoded.definitions.push((v[0], [v[2], v[3], v[4]]));
                }
            }
            b'!' => {
                let count = cur.number();
                let sixel = cur.peek().expect("repeat without character");
                cur.pos += 1;
                for _ in 0..count {
                    paint_sixel(&mut decoded, x, band, sixel, color);
                    x += 1;
                }
            }
            b'$' => x = 0,
            b'-' => {
                x = 0;
                band += 1;
            }
            0x3F..=0x7E => {
                paint_sixel(&mut decoded, x, band, b, color);
                x += 1;
            }
            0x1b => {
                assert_eq!(cur.peek(), Some(b'\\'), "unexpected escape");
                break;
            }
            0x9c => break,
            other => panic!("unexpected byte {other:#x} at {}", cur.pos - 1),
        }
    }
    decoded
}

fn paint_sixel(decoded: &mut Decoded, x: usize, band: usize, sixel: u8, color: usize) {
    let bits = sixel - 0x3F;
    for i in 0..6 {
        if bits & (1 << i) != 0 {
            decoded.paint(x, band * 6 + i, color);
        }
    }
}
