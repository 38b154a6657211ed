use crate::config::EmulatorConfig;
use crate::error::CoreError;
use crate::joypad::Joypad;
use crate::memory::mmu::Mmu;
use crate::memory::registers::LcdControl;
use crate::memory::{JOYPAD_REGISTER, LCD_CONTROL_REGISTER};
use crate::sgb::{gather_transfer, Sgb};
use crate::video::palette::PaletteSource;
use crate::video::ppu::{ColorSources, Frame, Ppu, PpuEvent};
use log::{debug, info};

pub const MAX_PLAYERS: usize = 4;

/// One emulated console: bus, PPU and, on SGB setups, the SGB side.
///
/// The CPU lives outside and drives everything through `read`, `write`
/// and `tick`.
#[derive(Clone)]
pub struct GameBoy {
    config: EmulatorConfig,
    mmu: Mmu,
    ppu: Ppu,
    sgb: Option<Sgb>,
    joypads: [Joypad; MAX_PLAYERS],
}

impl GameBoy {
    pub fn new(config: EmulatorConfig) -> Result<GameBoy, CoreError> {
        config.validate()?;

        let sgb = if config.sgb.enabled { Some(Sgb::new(config.sgb)) } else { None };
        info!(
            "Starting {} session with {} external RAM banks{}",
            config.mode,
            config.extern_ram_banks,
            if sgb.is_some() { " and SGB support" } else { "" }
        );

        Ok(GameBoy {
            mmu: Mmu::new(config.mode, config.extern_ram_banks),
            ppu: Ppu::new(),
            sgb,
            joypads: Default::default(),
            config,
        })
    }

    /// Power cycle, keeping the configuration and cartridge RAM.
    pub fn reset(&mut self) {
        let extern_ram = self.mmu.extern_ram().clone();
        self.mmu = Mmu::new(self.config.mode, self.config.extern_ram_banks);
        *self.mmu.extern_ram_mut() = extern_ram;
        self.ppu = Ppu::new();
        if let Some(sgb) = self.sgb.as_mut() {
            sgb.reset();
        }
        debug!("Session reset");
    }

    /// Turn the SGB side off for the rest of the session, for games that
    /// misbehave with it.
    pub fn disable_sgb(&mut self) {
        if self.sgb.take().is_some() {
            self.config.sgb.enabled = false;
            info!("SGB: Disabled");
        }
    }

    pub fn read(&self, addr: u16) -> Result<u8, CoreError> {
        match addr {
            JOYPAD_REGISTER => {
                let select = self.mmu.read(addr)?;
                Ok(match &self.sgb {
                    Some(sgb) => sgb.read_p1(&self.joypads),
                    None => self.joypads[0].as_u8(select),
                })
            }
            _ => self.mmu.read(addr),
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) -> Result<(), CoreError> {
        if addr == JOYPAD_REGISTER {
            if let Some(sgb) = self.sgb.as_mut() {
                sgb.write_p1(data);
            }
        }

        self.mmu.write(addr, data)
    }

    /// Advance video and SGB timing by `cycles` dots. Pending SGB VRAM
    /// transfers are completed from the screen at VBlank.
    pub fn tick(&mut self, cycles: u32) -> Result<Vec<PpuEvent>, CoreError> {
        let colors = ColorSources {
            compat: self.config.compat_palette.as_ref(),
            sgb: self.sgb.as_ref(),
        };
        let events = self.ppu.tick(&mut self.mmu, colors, cycles)?;

        if let Some(sgb) = self.sgb.as_mut() {
            sgb.tick(cycles);

            if events.contains(&PpuEvent::VBlank) && sgb.pending_transfer().is_some() {
                let lcdc = LcdControl::from(self.mmu.read(LCD_CONTROL_REGISTER)?);
                let data = gather_transfer(self.mmu.vram(), lcdc)?;
                sgb.complete_transfer(&data);
            }
        }

        Ok(events)
    }

    pub fn frame(&self) -> &Frame {
        self.ppu.frame()
    }

    /// Colors as the presentation layer should resolve them right now.
    pub fn palette_source(&self) -> PaletteSource<'_> {
        PaletteSource::from_mmu(
            &self.mmu,
            self.config.compat_palette.as_ref(),
            self.sgb.as_ref().map(|sgb| sgb.palettes()),
        )
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn sgb(&self) -> Option<&Sgb> {
        self.sgb.as_ref()
    }

    pub fn sgb_mut(&mut self) -> Option<&mut Sgb> {
        self.sgb.as_mut()
    }

    pub fn joypad(&self, player: usize) -> Option<&Joypad> {
        self.joypads.get(player)
    }

    pub fn joypad_mut(&mut self, player: usize) -> Option<&mut Joypad> {
        self.joypads.get_mut(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareMode;
    use crate::joypad::Button;
    use crate::sgb::command::ScreenMask;

    fn sgb_session() -> GameBoy {
        GameBoy::new(EmulatorConfig::new(HardwareMode::Dmg).with_sgb()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EmulatorConfig::new(HardwareMode::Cgb).with_sgb();
        assert!(matches!(GameBoy::new(config), Err(CoreError::InvalidConfiguration { .. })));
    }

    #[test]
    fn joypad_goes_through_p1() {
        let mut gb = GameBoy::new(EmulatorConfig::default()).unwrap();
        gb.joypad_mut(0).unwrap().update_button(Button::A, true);

        gb.write(JOYPAD_REGISTER, 0x10).unwrap();
        assert_eq!(gb.read(JOYPAD_REGISTER).unwrap() & 0x0f, 0x0e);
        gb.write(JOYPAD_REGISTER, 0x20).unwrap();
        assert_eq!(gb.read(JOYPAD_REGISTER).unwrap() & 0x0f, 0x0f);
        assert!(gb.joypad_mut(4).is_none());
    }

    #[test]
    fn sgb_sees_p1_writes() {
        let mut gb = sgb_session();
        gb.write(JOYPAD_REGISTER, 0x00).unwrap();
        assert!(gb.sgb().unwrap().sending());
        // The bus keeps the select lines too.
        assert_eq!(gb.mmu().read_io(JOYPAD_REGISTER).unwrap() & 0x30, 0x00);
    }

    #[test]
    fn disabling_sgb_falls_back_to_dmg_palettes() {
        let mut gb = sgb_session();
        assert!(matches!(gb.palette_source(), PaletteSource::Sgb { .. }));
        gb.disable_sgb();
        assert!(gb.sgb().is_none());
        assert!(matches!(gb.palette_source(), PaletteSource::Dmg(_)));
    }

    #[test]
    fn reset_keeps_cartridge_ram() {
        let mut gb = sgb_session();
        gb.mmu_mut().extern_ram_mut().write(3, 0x10, 0x42).unwrap();
        gb.write(0xc000, 0x99).unwrap();
        gb.sgb_mut().unwrap().write_p1(0x00);

        gb.reset();
        assert_eq!(gb.mmu().extern_ram().read(3, 0x10), Ok(0x42));
        assert_eq!(gb.read(0xc000), Ok(0x00));
        assert!(!gb.sgb().unwrap().sending());
        assert_eq!(gb.sgb().unwrap().mask(), ScreenMask::None);
    }

    #[test]
    fn clones_are_independent() {
        let mut gb = GameBoy::new(EmulatorConfig::default()).unwrap();
        let copy = gb.clone();
        gb.write(0xc123, 0x55).unwrap();
        assert_eq!(copy.read(0xc123), Ok(0x00));
        assert_eq!(copy.config().compat_palette.name(), "default");
    }
}
