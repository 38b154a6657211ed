use log::trace;

use crate::error::CoreError;
use crate::memory::{
    BACKGROUND_PALETTE_DATA_REGISTER, BACKGROUND_PALETTE_INDEX_REGISTER, OBJECT_PALETTE_DATA_REGISTER,
    OBJECT_PALETTE_INDEX_REGISTER,
};
use crate::video::palette::PaletteKind;

pub const CRAM_SIZE: usize = 64;

#[derive(Clone, Copy, Default)]
struct PaletteIndex {
    address: u8,
    auto_increment: bool,
}

impl PaletteIndex {
    fn write(&mut self, data: u8) {
        self.auto_increment = data & 0b1000_0000 != 0;
        self.address = data & 0b0011_1111;
    }

    // Bit 6 is unused and reads back as 1.
    fn read(&self) -> u8 {
        (self.auto_increment as u8) << 7 | 0b0100_0000 | self.address
    }

    fn advance(&mut self) {
        if self.auto_increment {
            self.address = self.address.wrapping_add(1) & 0b0011_1111;
        }
    }
}

/// CGB palette RAM: 8 background and 8 object palettes of 4 RGB555 colors.
#[derive(Clone)]
pub struct Cram {
    background_palette: [u8; CRAM_SIZE],
    object_palette: [u8; CRAM_SIZE],
    background_index: PaletteIndex,
    object_index: PaletteIndex,
}

impl Cram {
    pub fn new() -> Cram {
        Cram {
            background_palette: [0xff; CRAM_SIZE],
            object_palette: [0; CRAM_SIZE],
            background_index: PaletteIndex::default(),
            object_index: PaletteIndex::default(),
        }
    }

    /// Little-endian RGB555 entry for `color` (0-3) of `slot` (0-7).
    #[inline]
    pub fn fetch(&self, kind: PaletteKind, slot: u8, color: u8) -> u16 {
        let table = match kind {
            PaletteKind::Background => &self.background_palette,
            PaletteKind::Object => &self.object_palette,
        };
        let index = ((slot & 0b111) * 8 + (color & 0b11) * 2) as usize;
        (table[index + 1] as u16) << 8 | table[index] as u16
    }

    pub fn fetch_bg(&self, slot: u8, color: u8) -> u16 {
        self.fetch(PaletteKind::Background, slot, color)
    }

    pub fn fetch_obj(&self, slot: u8, color: u8) -> u16 {
        self.fetch(PaletteKind::Object, slot, color)
    }

    pub fn background_bytes(&self) -> &[u8; CRAM_SIZE] {
        &self.background_palette
    }

    pub fn object_bytes(&self) -> &[u8; CRAM_SIZE] {
        &self.object_palette
    }

    pub fn read(&self, addr: u16) -> Result<u8, CoreError> {
        match addr {
            BACKGROUND_PALETTE_INDEX_REGISTER => Ok(self.background_index.read()),
            BACKGROUND_PALETTE_DATA_REGISTER => {
                Ok(self.background_palette[self.background_index.address as usize])
            }
            OBJECT_PALETTE_INDEX_REGISTER => Ok(self.object_index.read()),
            OBJECT_PALETTE_DATA_REGISTER => Ok(self.object_palette[self.object_index.address as usize]),
            _ => Err(CoreError::InvalidIoRegister { register: addr }),
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) -> Result<(), CoreError> {
        match addr {
            BACKGROUND_PALETTE_INDEX_REGISTER => self.background_index.write(data),
            OBJECT_PALETTE_INDEX_REGISTER => self.object_index.write(data),
            BACKGROUND_PALETTE_DATA_REGISTER => {
                trace!("CRAM: BG[{:02x}] = {:02x}", self.background_index.address, data);
                self.background_palette[self.background_index.address as usize] = data;
                self.background_index.advance();
            }
            OBJECT_PALETTE_DATA_REGISTER => {
                trace!("CRAM: OBJ[{:02x}] = {:02x}", self.object_index.address, data);
                self.object_palette[self.object_index.address as usize] = data;
                self.object_index.advance();
            }
            _ => return Err(CoreError::InvalidIoRegister { register: addr }),
        }

        Ok(())
    }
}

impl Default for Cram {
    fn default() -> Cram {
        Cram::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_increment_wraps() {
        let mut cram = Cram::new();
        cram.write(BACKGROUND_PALETTE_INDEX_REGISTER, 0b1011_1111).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0x12).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0x34).unwrap();

        assert_eq!(cram.background_bytes()[0x3f], 0x12);
        assert_eq!(cram.background_bytes()[0x00], 0x34);
        assert_eq!(cram.read(BACKGROUND_PALETTE_INDEX_REGISTER), Ok(0b1100_0001));
    }

    #[test]
    fn indices_are_independent() {
        let mut cram = Cram::new();
        cram.write(BACKGROUND_PALETTE_INDEX_REGISTER, 0x02).unwrap();
        cram.write(OBJECT_PALETTE_INDEX_REGISTER, 0x80 | 0x08).unwrap();
        cram.write(OBJECT_PALETTE_DATA_REGISTER, 0x1f).unwrap();
        cram.write(OBJECT_PALETTE_DATA_REGISTER, 0x00).unwrap();

        assert_eq!(cram.fetch_obj(1, 0), 0x001f);
        assert_eq!(&cram.object_bytes()[0x08..0x0a], &[0x1f, 0x00]);
        assert_eq!(cram.background_bytes()[0x08], 0xff);
        assert_eq!(cram.read(BACKGROUND_PALETTE_INDEX_REGISTER), Ok(0x42));
    }

    #[test]
    fn fetch_layout() {
        let mut cram = Cram::new();
        // Palette 2, color 3 lives at 2 * 8 + 3 * 2 = 22.
        cram.write(BACKGROUND_PALETTE_INDEX_REGISTER, 22).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0xff).unwrap();
        cram.write(BACKGROUND_PALETTE_INDEX_REGISTER, 23).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0x7f).unwrap();
        assert_eq!(cram.fetch_bg(2, 3), 0x7fff);
    }
}
