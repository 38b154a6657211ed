use crate::error::CoreError;
use crate::memory::EXTERNAL_RAM_BANK_SIZE;

const BANK_MASK: u32 = 0x1e000;
const BANK_SHIFT: u32 = 13;
const OFFSET_MASK: u32 = 0x1fff;

pub const CAMERA_PHOTO_SLOTS: u8 = 30;
const CAMERA_SLOT_STRIDE: u32 = 0x1000;
const CAMERA_PHOTO_BASE: u32 = 0x2000;
const CAMERA_THUMBNAIL_BASE: u32 = 0x2e00;
const CAMERA_LAST_CAPTURED: u32 = 0x0100;

/// Cartridge RAM, one 8 KiB page per bank.
#[derive(Clone)]
pub struct ExternRam {
    banks: Vec<[u8; EXTERNAL_RAM_BANK_SIZE]>,
}

impl ExternRam {
    pub fn new(banks: usize) -> ExternRam {
        ExternRam {
            banks: vec![[0; EXTERNAL_RAM_BANK_SIZE]; banks],
        }
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Split a flat cartridge RAM address into `(bank, offset)`.
    ///
    /// Only bits 13-16 select the bank, so the camera's 128 KiB layout maps
    /// onto 16 banks.
    #[inline]
    pub fn locate(addr: u32) -> (usize, u16) {
        (((addr & BANK_MASK) >> BANK_SHIFT) as usize, (addr & OFFSET_MASK) as u16)
    }

    #[inline]
    pub fn read(&self, bank: usize, offset: u16) -> Result<u8, CoreError> {
        let page = self.page(bank)?;
        page.get(offset as usize)
            .copied()
            .ok_or(CoreError::ExternRamOffsetOutOfRange { offset })
    }

    #[inline]
    pub fn write(&mut self, bank: usize, offset: u16, data: u8) -> Result<(), CoreError> {
        let banks = self.banks.len();
        let page = self
            .banks
            .get_mut(bank)
            .ok_or(CoreError::InvalidExternRamBank { bank, banks })?;
        let slot = page
            .get_mut(offset as usize)
            .ok_or(CoreError::ExternRamOffsetOutOfRange { offset })?;
        *slot = data;
        Ok(())
    }

    pub fn read_flat(&self, addr: u32) -> Result<u8, CoreError> {
        let (bank, offset) = ExternRam::locate(addr);
        self.read(bank, offset)
    }

    pub fn write_flat(&mut self, addr: u32, data: u8) -> Result<(), CoreError> {
        let (bank, offset) = ExternRam::locate(addr);
        self.write(bank, offset, data)
    }

    pub fn page(&self, bank: usize) -> Result<&[u8; EXTERNAL_RAM_BANK_SIZE], CoreError> {
        self.banks.get(bank).ok_or(CoreError::InvalidExternRamBank {
            bank,
            banks: self.banks.len(),
        })
    }
}

/// A photo slot in Game Boy Camera SRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSlot {
    /// The picture currently held by the sensor, not yet saved to an album slot.
    LastCaptured,
    Photo(u8),
}

impl CameraSlot {
    /// `-1` names the last captured picture, `0..30` the album slots.
    pub fn from_index(index: i32) -> Result<CameraSlot, CoreError> {
        match index {
            -1 => Ok(CameraSlot::LastCaptured),
            0..=29 => Ok(CameraSlot::Photo(index as u8)),
            _ => Err(CoreError::InvalidCameraSlot { index }),
        }
    }

    pub fn photo_address(&self) -> u32 {
        match self {
            CameraSlot::LastCaptured => CAMERA_LAST_CAPTURED,
            CameraSlot::Photo(slot) => *slot as u32 * CAMERA_SLOT_STRIDE + CAMERA_PHOTO_BASE,
        }
    }

    /// The last captured picture has no thumbnail.
    pub fn thumbnail_address(&self) -> Result<u32, CoreError> {
        match self {
            CameraSlot::LastCaptured => Err(CoreError::InvalidCameraSlot { index: -1 }),
            CameraSlot::Photo(slot) => Ok(*slot as u32 * CAMERA_SLOT_STRIDE + CAMERA_THUMBNAIL_BASE),
        }
    }
}
