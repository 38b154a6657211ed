use crate::config::HardwareMode;
use crate::error::CoreError;

pub const VRAM_BANK_SIZE: usize = 0x2000;
pub const VRAM_BANKS: usize = 2;

/// Bank-relative offsets of the two tile maps.
pub const TILEMAP_0_OFFSET: u16 = 0x1800;
pub const TILEMAP_1_OFFSET: u16 = 0x1c00;
/// Bank-relative offsets of the two tile data blocks selected by LCDC.4.
pub const TILESET_0_OFFSET: u16 = 0x0000;
pub const TILESET_1_OFFSET: u16 = 0x0800;

/// Video RAM, stored bank-relative. Bank 1 only exists on color hardware.
#[derive(Clone)]
pub struct Vram {
    banks: [[u8; VRAM_BANK_SIZE]; VRAM_BANKS],
    mode: HardwareMode,
}

impl Vram {
    pub fn new(mode: HardwareMode) -> Vram {
        Vram {
            banks: [[0; VRAM_BANK_SIZE]; VRAM_BANKS],
            mode,
        }
    }

    #[inline]
    pub fn read(&self, bank: u8, offset: u16) -> Result<u8, CoreError> {
        let bank = self.check_bank(bank)?;
        let offset = check_offset(offset)?;
        Ok(self.banks[bank][offset])
    }

    #[inline]
    pub fn write(&mut self, bank: u8, offset: u16, data: u8) -> Result<(), CoreError> {
        let bank = self.check_bank(bank)?;
        let offset = check_offset(offset)?;
        self.banks[bank][offset] = data;
        Ok(())
    }

    /// Both bitplanes of one tile row, starting at `offset`.
    #[inline]
    pub fn read_pair(&self, bank: u8, offset: u16) -> Result<(u8, u8), CoreError> {
        Ok((self.read(bank, offset)?, self.read(bank, offset.wrapping_add(1))?))
    }

    /// Read-only view of a whole bank, for snapshotting.
    pub fn bank(&self, bank: u8) -> Result<&[u8; VRAM_BANK_SIZE], CoreError> {
        let bank = self.check_bank(bank)?;
        Ok(&self.banks[bank])
    }

    pub fn mode(&self) -> HardwareMode {
        self.mode
    }

    fn check_bank(&self, bank: u8) -> Result<usize, CoreError> {
        match bank {
            0 => Ok(0),
            1 if self.mode.is_color_hardware() => Ok(1),
            _ => Err(CoreError::InvalidVramBank { bank, mode: self.mode }),
        }
    }
}

#[inline]
fn check_offset(offset: u16) -> Result<usize, CoreError> {
    if (offset as usize) < VRAM_BANK_SIZE {
        Ok(offset as usize)
    } else {
        Err(CoreError::VramOffsetOutOfRange { offset })
    }
}
