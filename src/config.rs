use crate::error::CoreError;
use crate::video::compat::{CompatPalette, CompatPaletteTable};

/// Default number of 8 KiB external RAM banks. Large enough for the
/// Game Boy Camera, which keeps 30 photos in 128 KiB of SRAM.
pub const DEFAULT_EXTERN_RAM_BANKS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HardwareMode {
    /// Original monochrome hardware.
    #[default]
    Dmg,
    /// CGB hardware running a DMG-only cartridge. Colors come from the
    /// compatibility palettes selected by the boot ROM.
    GbcCompat,
    /// Native color mode.
    Cgb,
}

impl HardwareMode {
    /// Whether the console physically has the CGB-only memories (VRAM bank 1, WRAM banks).
    pub fn is_color_hardware(&self) -> bool {
        !matches!(self, HardwareMode::Dmg)
    }

    pub fn is_cgb(&self) -> bool {
        matches!(self, HardwareMode::Cgb)
    }
}

impl std::fmt::Display for HardwareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HardwareMode::Dmg => write!(f, "DMG"),
            HardwareMode::GbcCompat => write!(f, "GBC (DMG compatibility)"),
            HardwareMode::Cgb => write!(f, "CGB"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SgbConfig {
    pub enabled: bool,
    /// Reject packets that start before the 4 frame inter-packet delay
    /// has elapsed. Real games always wait, so this is off by default.
    pub enforce_packet_delay: bool,
}

#[derive(Clone)]
pub struct EmulatorConfig {
    pub mode: HardwareMode,
    pub extern_ram_banks: usize,
    pub sgb: SgbConfig,
    pub compat_palette: Box<dyn CompatPalette>,
}

impl EmulatorConfig {
    pub fn new(mode: HardwareMode) -> EmulatorConfig {
        EmulatorConfig {
            mode,
            ..EmulatorConfig::default()
        }
    }

    pub fn with_sgb(mut self) -> EmulatorConfig {
        self.sgb.enabled = true;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sgb.enabled && self.mode != HardwareMode::Dmg {
            return Err(CoreError::InvalidConfiguration {
                reason: format!("Super Game Boy support requires DMG mode, got {}", self.mode),
            });
        }

        if self.extern_ram_banks == 0 {
            return Err(CoreError::InvalidConfiguration {
                reason: "at least one external RAM bank is required".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for EmulatorConfig {
    fn default() -> EmulatorConfig {
        EmulatorConfig {
            mode: HardwareMode::default(),
            extern_ram_banks: DEFAULT_EXTERN_RAM_BANKS,
            sgb: SgbConfig::default(),
            compat_palette: Box::new(CompatPaletteTable::default()),
        }
    }
}

impl std::fmt::Debug for EmulatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("EmulatorConfig")
            .field("mode", &self.mode)
            .field("extern_ram_banks", &self.extern_ram_banks)
            .field("sgb", &self.sgb)
            .field("compat_palette", &self.compat_palette.name())
            .finish()
    }
}
