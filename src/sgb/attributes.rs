use log::trace;

pub const MAP_WIDTH: usize = 20;
pub const MAP_HEIGHT: usize = 18;
pub const MAP_CELLS: usize = MAP_WIDTH * MAP_HEIGHT;
pub const ATTRIBUTE_FILES: usize = 0x2d;
/// Packed size of one attribute file: 4 cells per byte.
pub const ATTRIBUTE_FILE_BYTES: usize = MAP_CELLS / 4;

/// Screen palette (0-3) for each 8x8 cell of the 160x144 screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMap {
    cells: [u8; MAP_CELLS],
}

impl AttributeMap {
    pub fn new() -> AttributeMap {
        AttributeMap { cells: [0; MAP_CELLS] }
    }

    /// Out-of-range cells read as palette 0.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= MAP_WIDTH || y >= MAP_HEIGHT {
            return 0;
        }
        self.cells[y * MAP_WIDTH + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, palette: u8) {
        if x < MAP_WIDTH && y < MAP_HEIGHT {
            self.cells[y * MAP_WIDTH + x] = palette & 0b11;
        }
    }

    pub fn fill(&mut self, palette: u8) {
        self.cells = [palette & 0b11; MAP_CELLS];
    }

    /// Unpack a 90 byte attribute file, 2 bits per cell, high bits first.
    pub fn from_packed(data: &[u8]) -> AttributeMap {
        let mut map = AttributeMap::new();
        for (i, cell) in map.cells.iter_mut().enumerate() {
            let byte = data.get(i / 4).copied().unwrap_or(0);
            *cell = (byte >> (6 - (i % 4) * 2)) & 0b11;
        }
        map
    }

    /// ATTR_BLK: up to 18 rectangles of 6 bytes each starting at byte 2.
    pub fn apply_blocks(&mut self, data: &[u8]) {
        let count = data.get(1).copied().unwrap_or(0) as usize & 0x1f;

        for block in data.get(2..).unwrap_or(&[]).chunks_exact(6).take(count) {
            let control = block[0] & 0b111;
            let palettes = block[1];
            let inside = palettes & 0b11;
            let outside = (palettes >> 4) & 0b11;
            // Setting only one side also colors the border with it.
            let (paint_border, border) = match control {
                0b001 => (true, inside),
                0b100 => (true, outside),
                _ => (control & 0b010 != 0, (palettes >> 2) & 0b11),
            };
            let (x1, y1) = ((block[2] & 0x1f) as usize, (block[3] & 0x1f) as usize);
            let (x2, y2) = ((block[4] & 0x1f) as usize, (block[5] & 0x1f) as usize);
            trace!("SGB: ATTR_BLK ({}, {})-({}, {}) control {:03b}", x1, y1, x2, y2, control);

            for y in 0..MAP_HEIGHT {
                for x in 0..MAP_WIDTH {
                    let within = x >= x1 && x <= x2 && y >= y1 && y <= y2;
                    let on_edge = within && (x == x1 || x == x2 || y == y1 || y == y2);

                    if on_edge {
                        if paint_border {
                            self.set(x, y, border);
                        }
                    } else if within {
                        if control & 0b001 != 0 {
                            self.set(x, y, inside);
                        }
                    } else if control & 0b100 != 0 {
                        self.set(x, y, outside);
                    }
                }
            }
        }
    }

    /// ATTR_LIN: one byte per line. Bit 7 picks a row (1) or a column (0).
    pub fn apply_lines(&mut self, data: &[u8]) {
        let count = data.get(1).copied().unwrap_or(0) as usize;

        for &line in data.get(2..).unwrap_or(&[]).iter().take(count) {
            let index = (line & 0x1f) as usize;
            let palette = (line >> 5) & 0b11;
            if line & 0x80 != 0 {
                for x in 0..MAP_WIDTH {
                    self.set(x, index, palette);
                }
            } else {
                for y in 0..MAP_HEIGHT {
                    self.set(index, y, palette);
                }
            }
        }
    }

    /// ATTR_DIV: split the screen at one row or column.
    pub fn apply_divide(&mut self, data: &[u8]) {
        let control = data.get(1).copied().unwrap_or(0);
        let split = data.get(2).copied().unwrap_or(0) as usize & 0x1f;
        let after = control & 0b11;
        let before = (control >> 2) & 0b11;
        let on_line = (control >> 4) & 0b11;
        let horizontal = control & 0b0100_0000 != 0;

        for y in 0..MAP_HEIGHT {
            for x in 0..MAP_WIDTH {
                let position = if horizontal { y } else { x };
                let palette = match position {
                    p if p < split => before,
                    p if p == split => on_line,
                    _ => after,
                };
                self.set(x, y, palette);
            }
        }
    }

    /// ATTR_CHR: a run of 2 bit cells starting at (byte 1, byte 2).
    pub fn apply_characters(&mut self, data: &[u8]) {
        let mut x = data.get(1).copied().unwrap_or(0) as usize % MAP_WIDTH;
        let mut y = data.get(2).copied().unwrap_or(0) as usize % MAP_HEIGHT;
        let count = u16::from_le_bytes([data.get(3).copied().unwrap_or(0), data.get(4).copied().unwrap_or(0)]) as usize;
        let vertical = data.get(5).copied().unwrap_or(0) & 0b1 != 0;
        let payload = data.get(6..).unwrap_or(&[]);

        for i in 0..count.min(MAP_CELLS).min(payload.len() * 4) {
            let palette = (payload[i / 4] >> (6 - (i % 4) * 2)) & 0b11;
            self.set(x, y, palette);

            if vertical {
                y += 1;
                if y == MAP_HEIGHT {
                    y = 0;
                    x = (x + 1) % MAP_WIDTH;
                }
            } else {
                x += 1;
                if x == MAP_WIDTH {
                    x = 0;
                    y = (y + 1) % MAP_HEIGHT;
                }
            }
        }
    }
}

impl Default for AttributeMap {
    fn default() -> AttributeMap {
        AttributeMap::new()
    }
}
