use crate::config::HardwareMode;
use crate::memory::mmu::Mmu;
use crate::memory::{BG_PALETTE_REGISTER, OBJ0_PALETTE_REGISTER, OBJ1_PALETTE_REGISTER};
use crate::sgb::SgbPalettes;
use crate::video::compat::CompatPalette;
use crate::video::cram::Cram;
use crate::video::tile::TileAttributes;

pub type Color = [u8; 3];

pub const BLACK: Color = [0x00, 0x00, 0x00];

/// The four DMG shades, lightest first.
pub const DMG_SHADES: [Color; 4] = [[255, 255, 255], [168, 168, 168], [80, 80, 80], [0, 0, 0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    Background,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Shade {
    /// Look up `color` (0-3) in a BGP/OBP-style register.
    pub fn from_register(register: u8, color: u8) -> Shade {
        match (register >> ((color & 0b11) * 2)) & 0b11 {
            0b00 => Shade::White,
            0b01 => Shade::LightGray,
            0b10 => Shade::DarkGray,
            _ => Shade::Black,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Shade::White => 0,
            Shade::LightGray => 1,
            Shade::DarkGray => 2,
            Shade::Black => 3,
        }
    }
}

impl From<Shade> for Color {
    fn from(shade: Shade) -> Color {
        DMG_SHADES[shade.index() as usize]
    }
}

impl Default for Shade {
    fn default() -> Shade {
        Shade::White
    }
}

/// Expand RGB555 to 8 bits per channel by shifting left 3. No rounding.
#[inline]
pub fn rgb555_to_color(value: u16) -> Color {
    [
        ((value & 0x1f) << 3) as u8,
        (((value >> 5) & 0x1f) << 3) as u8,
        (((value >> 10) & 0x1f) << 3) as u8,
    ]
}

/// Snapshot of BGP, OBP0 and OBP1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmgPalettes {
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
}

impl DmgPalettes {
    pub fn from_mmu(mmu: &Mmu) -> DmgPalettes {
        DmgPalettes {
            bgp: mmu.io_register(BG_PALETTE_REGISTER),
            obp0: mmu.io_register(OBJ0_PALETTE_REGISTER),
            obp1: mmu.io_register(OBJ1_PALETTE_REGISTER),
        }
    }

    /// Only BGP backs background palette 0 and OBP0/OBP1 back object palettes 0 and 1.
    /// Anything else has no register behind it.
    pub fn shade(&self, kind: PaletteKind, palette: u8, color: u8) -> Option<Shade> {
        let register = match (kind, palette) {
            (PaletteKind::Background, 0) => self.bgp,
            (PaletteKind::Object, 0) => self.obp0,
            (PaletteKind::Object, 1) => self.obp1,
            _ => return None,
        };
        Some(Shade::from_register(register, color))
    }
}

/// Where pixel colors come from. Picked once from the hardware mode so the
/// renderers never branch on it themselves.
#[derive(Clone, Copy)]
pub enum PaletteSource<'a> {
    Dmg(DmgPalettes),
    Compat {
        registers: DmgPalettes,
        table: &'a dyn CompatPalette,
    },
    Cgb(&'a Cram),
    Sgb {
        registers: DmgPalettes,
        palettes: &'a SgbPalettes,
    },
}

impl<'a> PaletteSource<'a> {
    /// Pick the source for the bus's hardware mode. SGB palettes only apply
    /// on DMG hardware.
    pub fn from_mmu(mmu: &'a Mmu, compat: &'a dyn CompatPalette, sgb: Option<&'a SgbPalettes>) -> PaletteSource<'a> {
        let registers = DmgPalettes::from_mmu(mmu);
        match (mmu.mode(), sgb) {
            (HardwareMode::Cgb, _) => PaletteSource::Cgb(mmu.cram()),
            (HardwareMode::GbcCompat, _) => PaletteSource::Compat {
                registers,
                table: compat,
            },
            (HardwareMode::Dmg, Some(palettes)) => PaletteSource::Sgb { registers, palettes },
            (HardwareMode::Dmg, None) => PaletteSource::Dmg(registers),
        }
    }

    /// Color for `color` (0-3) of palette `palette`.
    ///
    /// Palettes without hardware behind them (object palette > 1 or background
    /// palette > 0 outside CGB mode) come out black. Transparency of object
    /// color 0 is the caller's business.
    pub fn resolve(&self, kind: PaletteKind, palette: u8, color: u8) -> Color {
        self.resolve_in_region(kind, palette, color, 0)
    }

    /// Background color for a tile with the given CGB attributes. Outside
    /// CGB mode the attribute palette bits are ignored.
    pub fn resolve_background(&self, attributes: TileAttributes, color: u8) -> Color {
        match self {
            PaletteSource::Cgb(_) => self.resolve(PaletteKind::Background, attributes.palette(), color),
            _ => self.resolve(PaletteKind::Background, 0, color),
        }
    }

    /// Like [`PaletteSource::resolve`], but with the SGB attribute-map palette
    /// (`region`, 0-3) that covers the pixel. Other sources ignore `region`.
    pub fn resolve_in_region(&self, kind: PaletteKind, palette: u8, color: u8, region: u8) -> Color {
        match self {
            PaletteSource::Dmg(registers) => match registers.shade(kind, palette, color) {
                Some(shade) => shade.into(),
                None => BLACK,
            },
            PaletteSource::Compat { registers, table } => match (kind, registers.shade(kind, palette, color)) {
                (PaletteKind::Background, Some(shade)) => rgb555_to_color(table.background_color(shade.index())),
                (PaletteKind::Object, Some(shade)) => rgb555_to_color(table.object_color(palette, shade.index())),
                (_, None) => BLACK,
            },
            PaletteSource::Cgb(cram) => rgb555_to_color(cram.fetch(kind, palette, color)),
            PaletteSource::Sgb { registers, palettes } => match registers.shade(kind, palette, color) {
                Some(shade) => rgb555_to_color(palettes.color(region, shade.index())),
                None => BLACK,
            },
        }
    }

    pub fn is_cgb(&self) -> bool {
        matches!(self, PaletteSource::Cgb(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{BACKGROUND_PALETTE_DATA_REGISTER, BACKGROUND_PALETTE_INDEX_REGISTER};
    use crate::video::compat::CompatPaletteTable;

    #[test]
    fn dmg_only_produces_the_four_shades() {
        for register in 0..=255u8 {
            let source = PaletteSource::Dmg(DmgPalettes {
                bgp: register,
                obp0: register,
                obp1: register,
            });
            for color in 0..4 {
                for (kind, palette) in [(PaletteKind::Background, 0), (PaletteKind::Object, 0), (PaletteKind::Object, 1)] {
                    assert!(DMG_SHADES.contains(&source.resolve(kind, palette, color)));
                }
            }
        }
    }

    #[test]
    fn dmg_register_lookup() {
        let source = PaletteSource::Dmg(DmgPalettes {
            bgp: 0b1110_0100,
            obp0: 0b0001_1011,
            obp1: 0,
        });
        assert_eq!(source.resolve(PaletteKind::Background, 0, 0), [255, 255, 255]);
        assert_eq!(source.resolve(PaletteKind::Background, 0, 3), [0, 0, 0]);
        assert_eq!(source.resolve(PaletteKind::Object, 0, 0), [0, 0, 0]);
        assert_eq!(source.resolve(PaletteKind::Object, 0, 2), [168, 168, 168]);
    }

    #[test]
    fn unmapped_palettes_are_black() {
        let registers = DmgPalettes { bgp: 0, obp0: 0, obp1: 0 };
        let table = CompatPaletteTable::default();
        let sources = [
            PaletteSource::Dmg(registers),
            PaletteSource::Compat { registers, table: &table },
        ];
        for source in sources {
            assert_eq!(source.resolve(PaletteKind::Object, 2, 1), BLACK);
            assert_eq!(source.resolve(PaletteKind::Background, 1, 1), BLACK);
            assert_ne!(source.resolve(PaletteKind::Background, 0, 1), BLACK);
        }
    }

    #[test]
    fn compat_goes_through_register_then_table() {
        let registers = DmgPalettes { bgp: 0b1110_0100, obp0: 0b1110_0100, obp1: 0b0000_0011 };
        let table = CompatPaletteTable::new("test", [1, 2, 3, 0x7fff], [4, 5, 6, 7], [0x001f, 9, 10, 11]);
        let source = PaletteSource::Compat { registers, table: &table };

        assert_eq!(source.resolve(PaletteKind::Background, 0, 3), [248, 248, 248]);
        // OBP1 maps color 1 to shade 0, which the table colors 0x001f.
        assert_eq!(source.resolve(PaletteKind::Object, 1, 1), rgb555_to_color(0x001f));
        assert_eq!(source.resolve(PaletteKind::Object, 1, 0), rgb555_to_color(11));
    }

    #[test]
    fn cgb_expansion_is_a_plain_shift() {
        assert_eq!(rgb555_to_color(0x0000), [0, 0, 0]);
        assert_eq!(rgb555_to_color(0x7fff), [248, 248, 248]);
        assert_eq!(rgb555_to_color(0b00001_00010_00011), [3 << 3, 2 << 3, 1 << 3]);
    }

    #[test]
    fn cgb_background_uses_attribute_palette() {
        let mut cram = Cram::new();
        cram.write(BACKGROUND_PALETTE_INDEX_REGISTER, 0x80 | (5 * 8 + 2)).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0x1f).unwrap();
        cram.write(BACKGROUND_PALETTE_DATA_REGISTER, 0x00).unwrap();

        let source = PaletteSource::Cgb(&cram);
        let attributes = TileAttributes::from_bits_truncate(5);
        assert_eq!(source.resolve_background(attributes, 1), [248, 0, 0]);
    }

    #[test]
    fn background_color_zero_is_opaque() {
        let source = PaletteSource::Dmg(DmgPalettes { bgp: 0b1111_1111, obp0: 0, obp1: 0 });
        assert_eq!(source.resolve_background(TileAttributes::empty(), 0), [0, 0, 0]);
    }
}
