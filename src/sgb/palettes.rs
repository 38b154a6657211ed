pub const NUM_PALETTES: usize = 8;
pub const SCREEN_PALETTES: usize = 4;
pub const COLORS_PER_PALETTE: usize = 16;
pub const SYSTEM_PALETTES: usize = 512;

/// Power-on screen palette, the DMG grays in RGB555.
const DEFAULT_SCREEN_COLORS: [u16; 4] = [0x7fff, 0x56b5, 0x294a, 0x0000];

/// SGB color tables.
///
/// Palettes 0-3 color the Game Boy screen and only use their first four
/// entries. Palettes 4-7 belong to the border. Color 0 is shared by all
/// screen palettes and is kept in sync on every write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SgbPalettes {
    palettes: [[u16; COLORS_PER_PALETTE]; NUM_PALETTES],
    system: Vec<[u16; 4]>,
}

impl SgbPalettes {
    pub fn new() -> SgbPalettes {
        let mut palettes = [[0; COLORS_PER_PALETTE]; NUM_PALETTES];
        for palette in palettes.iter_mut().take(SCREEN_PALETTES) {
            palette[..4].copy_from_slice(&DEFAULT_SCREEN_COLORS);
        }

        SgbPalettes {
            palettes,
            system: vec![[0; 4]; SYSTEM_PALETTES],
        }
    }

    /// RGB555 color `shade` (0-3) of screen palette `region` (0-3).
    #[inline]
    pub fn color(&self, region: u8, shade: u8) -> u16 {
        self.palettes[(region & 0b11) as usize][(shade & 0b11) as usize]
    }

    #[inline]
    pub fn backdrop(&self) -> u16 {
        self.palettes[0][0]
    }

    pub fn palette(&self, index: usize) -> Option<&[u16; COLORS_PER_PALETTE]> {
        self.palettes.get(index)
    }

    pub fn system_palette(&self, index: usize) -> Option<&[u16; 4]> {
        self.system.get(index)
    }

    pub fn set_shared_color(&mut self, color: u16) {
        for palette in self.palettes.iter_mut().take(SCREEN_PALETTES) {
            palette[0] = color;
        }
    }

    /// Colors 1-3 of screen palette `index`.
    pub fn set_screen_colors(&mut self, index: usize, colors: [u16; 3]) {
        if let Some(palette) = self.palettes.get_mut(index & 0b11) {
            palette[1..4].copy_from_slice(&colors);
        }
    }

    /// Copy system palettes into the four screen palettes. The first one's
    /// color 0 becomes the shared color.
    pub fn load_system(&mut self, indices: [usize; 4]) {
        for (slot, &index) in indices.iter().enumerate() {
            let colors = self.system[index % SYSTEM_PALETTES];
            self.palettes[slot][..4].copy_from_slice(&colors);
        }
        let shared = self.palettes[0][0];
        self.set_shared_color(shared);
    }

    /// PAL_TRN payload: 512 palettes of 4 little-endian colors.
    pub fn load_system_table(&mut self, data: &[u8]) {
        for (palette, chunk) in self.system.iter_mut().zip(data.chunks_exact(8)) {
            for (color, bytes) in palette.iter_mut().zip(chunk.chunks_exact(2)) {
                *color = u16::from_le_bytes([bytes[0], bytes[1]]);
            }
        }
    }

    /// PCT_TRN palette block: border palettes 4-7, 16 colors each.
    pub fn load_border(&mut self, data: &[u8]) {
        let border = self.palettes.iter_mut().skip(SCREEN_PALETTES);
        for (palette, chunk) in border.zip(data.chunks_exact(COLORS_PER_PALETTE * 2)) {
            for (color, bytes) in palette.iter_mut().zip(chunk.chunks_exact(2)) {
                *color = u16::from_le_bytes([bytes[0], bytes[1]]);
            }
        }
    }
}

impl Default for SgbPalettes {
    fn default() -> SgbPalettes {
        SgbPalettes::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_color_reaches_every_screen_palette() {
        let mut palettes = SgbPalettes::new();
        palettes.set_shared_color(0x1234);
        for region in 0..4 {
            assert_eq!(palettes.color(region, 0), 0x1234);
        }
        assert_eq!(palettes.palette(4).map(|p| p[0]), Some(0));
    }

    #[test]
    fn system_palettes_load_into_screen_slots() {
        let mut palettes = SgbPalettes::new();
        let mut table = vec![0u8; SYSTEM_PALETTES * 8];
        // Palette 3: 0x0001, 0x0002, 0x0003, 0x0004.
        for i in 0..4u8 {
            table[3 * 8 + i as usize * 2] = i + 1;
        }
        palettes.load_system_table(&table);
        palettes.load_system([3, 0, 0, 3]);

        assert_eq!(palettes.color(0, 2), 0x0003);
        assert_eq!(palettes.color(3, 3), 0x0004);
        // Color 0 follows the first palette everywhere.
        assert_eq!(palettes.color(1, 0), 0x0001);
    }
}
