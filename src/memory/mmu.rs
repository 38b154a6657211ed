use crate::config::HardwareMode;
use crate::error::CoreError;
use crate::memory::extern_ram::ExternRam;
use crate::memory::io::IoPorts;
use crate::memory::oam::{Oam, OAM_SIZE};
use crate::memory::registers::InterruptFlags;
use crate::memory::vram::Vram;
use crate::memory::*;
use crate::video::cram::Cram;
use log::{debug, trace};

const ROM_RANGE: std::ops::RangeInclusive<u16> = 0x0000..=0x7fff;
const VRAM_RANGE: std::ops::RangeInclusive<u16> = VRAM_START..=VRAM_END;
const EXTERNAL_RAM_RANGE: std::ops::RangeInclusive<u16> = EXTERNAL_RAM_START..=EXTERNAL_RAM_END;
const WORK_RAM_RANGE: std::ops::RangeInclusive<u16> = WORK_RAM_START..=WORK_RAM_END;
const ECHO_RAM_RANGE: std::ops::RangeInclusive<u16> = ECHO_RAM_START..=ECHO_RAM_END;
const OAM_RANGE: std::ops::RangeInclusive<u16> = OAM_START..=OAM_END;
const UNUSABLE_RANGE: std::ops::RangeInclusive<u16> = UNUSABLE_START..=UNUSABLE_END;
const CGB_PALETTE_RANGE: std::ops::RangeInclusive<u16> =
    BACKGROUND_PALETTE_INDEX_REGISTER..=OBJECT_PALETTE_DATA_REGISTER;

const WORK_RAM_SIZE: usize = 0x2000;
const STAT_WRITABLE: u8 = 0b0111_1000;

/// Video, object, cartridge and work RAM plus the I/O register file.
///
/// Cartridge ROM and the mapper live outside this crate; the mapper tells us
/// which external RAM bank is paged in through [`Mmu::set_extern_ram_bank`].
#[derive(Clone)]
pub struct Mmu {
    mode: HardwareMode,
    vram: Vram,
    vram_bank: u8,
    oam: Oam,
    extern_ram: ExternRam,
    extern_ram_bank: usize,
    work_ram: [u8; WORK_RAM_SIZE],
    io: IoPorts,
    cram: Cram,
}

impl Mmu {
    pub fn new(mode: HardwareMode, extern_ram_banks: usize) -> Mmu {
        let mut mmu = Mmu {
            mode,
            vram: Vram::new(mode),
            vram_bank: 0,
            oam: Oam::new(),
            extern_ram: ExternRam::new(extern_ram_banks),
            extern_ram_bank: 0,
            work_ram: [0; WORK_RAM_SIZE],
            io: IoPorts::new(),
            cram: Cram::new(),
        };
        mmu.apply_post_boot_io_state();
        mmu
    }

    /// Register values left behind by the boot ROM.
    fn apply_post_boot_io_state(&mut self) {
        let defaults: [(u16, u8); 8] = [
            (JOYPAD_REGISTER, 0xcf),
            (INTERRUPT_FLAGS_REGISTER, 0x01),
            (LCD_CONTROL_REGISTER, 0x91),
            (LCD_STATUS_REGISTER, 0x85),
            (OAM_DMA_REGISTER, 0xff),
            (BG_PALETTE_REGISTER, 0xfc),
            (OBJ0_PALETTE_REGISTER, 0xff),
            (OBJ1_PALETTE_REGISTER, 0xff),
        ];

        for (register, value) in defaults {
            self.set_io_register(register, value);
        }
    }

    pub fn mode(&self) -> HardwareMode {
        self.mode
    }

    pub fn read(&self, addr: u16) -> Result<u8, CoreError> {
        match addr {
            addr if ROM_RANGE.contains(&addr) => {
                trace!("MMU: Read from cartridge ROM ${:04x} with no cartridge attached", addr);
                Ok(0xff)
            }
            addr if VRAM_RANGE.contains(&addr) => self.vram.read(self.vram_bank, addr - VRAM_START),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                self.extern_ram.read(self.extern_ram_bank, addr - EXTERNAL_RAM_START)
            }
            addr if WORK_RAM_RANGE.contains(&addr) => Ok(self.work_ram[(addr - WORK_RAM_START) as usize]),
            addr if ECHO_RAM_RANGE.contains(&addr) => Ok(self.work_ram[(addr - ECHO_RAM_START) as usize]),
            addr if OAM_RANGE.contains(&addr) => self.oam.read(addr - OAM_START),
            addr if UNUSABLE_RANGE.contains(&addr) => Ok(0xff),
            VRAM_BANK_REGISTER => Ok(if self.mode.is_cgb() { 0xfe | self.vram_bank } else { 0xff }),
            addr if CGB_PALETTE_RANGE.contains(&addr) => {
                if self.mode.is_cgb() {
                    self.cram.read(addr)
                } else {
                    Ok(0xff)
                }
            }
            INTERRUPT_FLAGS_REGISTER => Ok(self.io.read(addr)? | 0b1110_0000),
            LCD_STATUS_REGISTER => Ok(self.io.read(addr)? | 0b1000_0000),
            _ => self.io.read(addr),
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) -> Result<(), CoreError> {
        match addr {
            addr if ROM_RANGE.contains(&addr) => {
                trace!("MMU: Ignoring mapper write ${:04x} = {:02x}", addr, data);
            }
            addr if VRAM_RANGE.contains(&addr) => self.vram.write(self.vram_bank, addr - VRAM_START, data)?,
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                self.extern_ram.write(self.extern_ram_bank, addr - EXTERNAL_RAM_START, data)?
            }
            addr if WORK_RAM_RANGE.contains(&addr) => self.work_ram[(addr - WORK_RAM_START) as usize] = data,
            addr if ECHO_RAM_RANGE.contains(&addr) => self.work_ram[(addr - ECHO_RAM_START) as usize] = data,
            addr if OAM_RANGE.contains(&addr) => self.oam.write(addr - OAM_START, data)?,
            addr if UNUSABLE_RANGE.contains(&addr) => {}
            VRAM_BANK_REGISTER => {
                if self.mode.is_cgb() {
                    self.vram_bank = data & 0b1;
                    trace!("MMU: Switched to VRAM bank {}", self.vram_bank);
                }
            }
            addr if CGB_PALETTE_RANGE.contains(&addr) => {
                if self.mode.is_cgb() {
                    self.cram.write(addr, data)?;
                }
            }
            OAM_DMA_REGISTER => {
                self.io.write(addr, data)?;
                self.oam_dma(data)?;
            }
            // Any write restarts the line counter.
            SCANLINE_Y_REGISTER => self.io.write(addr, 0)?,
            LCD_STATUS_REGISTER => {
                let current = self.io.read(addr)?;
                self.io.write(addr, (current & !STAT_WRITABLE) | (data & STAT_WRITABLE))?;
            }
            INTERRUPT_FLAGS_REGISTER => self.io.write(addr, data & 0b0001_1111)?,
            _ => self.io.write(addr, data)?,
        }

        Ok(())
    }

    /// Copy 160 bytes from `page << 8` into OAM in one go.
    fn oam_dma(&mut self, page: u8) -> Result<(), CoreError> {
        let source = (page as u16) << 8;
        let mut data = [0u8; OAM_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read(source.wrapping_add(i as u16))?;
        }
        self.oam.load(&data);
        debug!("MMU: OAM DMA from ${:04x}", source);
        Ok(())
    }

    /// Raw register file access, no side effects.
    pub fn read_io(&self, register: u16) -> Result<u8, CoreError> {
        self.io.read(register)
    }

    /// Raw register file access, no side effects.
    pub fn write_io(&mut self, register: u16, data: u8) -> Result<(), CoreError> {
        self.io.write(register, data)
    }

    /// Infallible register read for the fixed addresses the core uses itself.
    #[inline]
    pub(crate) fn io_register(&self, register: u16) -> u8 {
        self.io.read(register).unwrap_or(0xff)
    }

    #[inline]
    pub(crate) fn set_io_register(&mut self, register: u16, data: u8) {
        if let Err(e) = self.io.write(register, data) {
            debug!("MMU: {}", e);
        }
    }

    pub(crate) fn request_interrupt(&mut self, flags: InterruptFlags) {
        let current = InterruptFlags::from(self.io_register(INTERRUPT_FLAGS_REGISTER));
        self.set_io_register(INTERRUPT_FLAGS_REGISTER, (current | flags).bits());
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    pub fn vram_bank(&self) -> u8 {
        self.vram_bank
    }

    pub fn oam(&self) -> &Oam {
        &self.oam
    }

    pub fn oam_mut(&mut self) -> &mut Oam {
        &mut self.oam
    }

    pub fn extern_ram(&self) -> &ExternRam {
        &self.extern_ram
    }

    pub fn extern_ram_mut(&mut self) -> &mut ExternRam {
        &mut self.extern_ram
    }

    pub fn set_extern_ram_bank(&mut self, bank: usize) -> Result<(), CoreError> {
        if bank >= self.extern_ram.bank_count() {
            return Err(CoreError::InvalidExternRamBank {
                bank,
                banks: self.extern_ram.bank_count(),
            });
        }
        self.extern_ram_bank = bank;
        Ok(())
    }

    pub fn cram(&self) -> &Cram {
        &self.cram
    }

    pub fn cram_mut(&mut self) -> &mut Cram {
        &mut self.cram
    }
}
