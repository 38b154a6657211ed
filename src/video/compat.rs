use dyn_clone::DynClone;

/// Colors a CGB assigns to DMG shades when running a monochrome cartridge.
///
/// The boot ROM picks these from a title-checksum table; this crate only
/// consumes the result. Colors are RGB555.
pub trait CompatPalette: DynClone {
    fn background_color(&self, shade: u8) -> u16;
    /// `palette` is 0 for OBP0 and 1 for OBP1.
    fn object_color(&self, palette: u8, shade: u8) -> u16;
    fn name(&self) -> String;
}

dyn_clone::clone_trait_object!(CompatPalette);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompatPaletteTable {
    name: String,
    background: [u16; 4],
    object0: [u16; 4],
    object1: [u16; 4],
}

impl CompatPaletteTable {
    pub fn new(name: &str, background: [u16; 4], object0: [u16; 4], object1: [u16; 4]) -> CompatPaletteTable {
        CompatPaletteTable {
            name: name.to_string(),
            background,
            object0,
            object1,
        }
    }

    pub fn grayscale() -> CompatPaletteTable {
        const GRAY: [u16; 4] = [0x7fff, 0x56b5, 0x294a, 0x0000];
        CompatPaletteTable::new("grayscale", GRAY, GRAY, GRAY)
    }
}

impl Default for CompatPaletteTable {
    /// The boot ROM's fallback for cartridges it does not recognise.
    fn default() -> CompatPaletteTable {
        CompatPaletteTable::new(
            "default",
            [0x7fff, 0x1bef, 0x6180, 0x0000],
            [0x7fff, 0x421f, 0x1cf2, 0x0000],
            [0x7fff, 0x421f, 0x1cf2, 0x0000],
        )
    }
}

impl CompatPalette for CompatPaletteTable {
    #[inline]
    fn background_color(&self, shade: u8) -> u16 {
        self.background[(shade & 0b11) as usize]
    }

    #[inline]
    fn object_color(&self, palette: u8, shade: u8) -> u16 {
        match palette {
            0 => self.object0[(shade & 0b11) as usize],
            _ => self.object1[(shade & 0b11) as usize],
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
