use crate::config::HardwareMode;
use crate::error::CoreError;
use crate::memory::registers::LcdControl;
use crate::memory::vram::Vram;
use crate::video::tile::{decode_tile_row, Flip, TileRow};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpriteAttributes: u8 {
        const CGB_PALETTE = 0b0000_0111;
        const BANK        = 0b0000_1000;
        const DMG_PALETTE = 0b0001_0000;
        const FLIP_X      = 0b0010_0000;
        const FLIP_Y      = 0b0100_0000;
        /// Background colors 1-3 are drawn over the sprite.
        const PRIORITY    = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub index: usize,
    pub y: u8,
    pub x: u8,
    pub tile_index: u8,
    pub attributes: SpriteAttributes,
}

impl Sprite {
    pub fn new(index: usize, y: u8, x: u8, tile_index: u8, attributes: u8) -> Sprite {
        Sprite {
            index,
            y,
            x,
            tile_index,
            attributes: SpriteAttributes::from_bits_truncate(attributes),
        }
    }

    /// First tile of the sprite. 8x16 sprites ignore bit 0 of the tile number.
    #[inline]
    pub fn tile_for_height(&self, height: u8) -> u8 {
        if height == 16 {
            self.tile_index & 0xfe
        } else {
            self.tile_index
        }
    }

    /// The bank bit only means something in CGB mode.
    pub fn vram_bank(&self, mode: HardwareMode) -> u8 {
        if mode.is_cgb() && self.attributes.contains(SpriteAttributes::BANK) {
            1
        } else {
            0
        }
    }

    /// CGB palette 0-7 in CGB mode, OBP0/OBP1 otherwise.
    pub fn palette(&self, mode: HardwareMode) -> u8 {
        if mode.is_cgb() {
            (self.attributes & SpriteAttributes::CGB_PALETTE).bits()
        } else {
            self.attributes.contains(SpriteAttributes::DMG_PALETTE) as u8
        }
    }

    pub fn flip(&self) -> Flip {
        Flip {
            x: self.attributes.contains(SpriteAttributes::FLIP_X),
            y: self.attributes.contains(SpriteAttributes::FLIP_Y),
        }
    }

    pub fn behind_background(&self) -> bool {
        self.attributes.contains(SpriteAttributes::PRIORITY)
    }

    /// Whether any part of the sprite lands on the 160x144 screen.
    ///
    /// Coordinates are stored shifted by 8 horizontally and 16 vertically.
    /// Decoding never looks at this; it is for views that want to mark
    /// hidden sprites.
    pub fn is_on_screen(&self, height: u8) -> bool {
        if self.x == 0 || self.x >= 168 {
            return false;
        }

        if height == 16 {
            self.y > 0 && self.y < 160
        } else {
            self.y > 8 && self.y < 160
        }
    }

    pub fn is_visible_on_scanline(&self, scanline: u8, height: u8) -> bool {
        let top = self.y as i16 - 16;
        let line = scanline as i16;
        line >= top && line < top + height as i16
    }

    pub fn screen_x(&self) -> i16 {
        self.x as i16 - 8
    }

    pub fn screen_y(&self) -> i16 {
        self.y as i16 - 16
    }
}

/// A decoded sprite: `height` rows of color indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpritePixels {
    height: u8,
    rows: [TileRow; 16],
}

impl SpritePixels {
    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn rows(&self) -> &[TileRow] {
        &self.rows[..self.height as usize]
    }

    /// Color index at (`x`, `y`), or `None` outside the sprite.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        self.rows().get(y).and_then(|row| row.get(x)).copied()
    }
}

/// Decode row `row` (0-based from the top as displayed) of a sprite.
///
/// Vertical flip mirrors across the whole sprite height, so in 8x16 mode the
/// bottom tile's last row becomes the first.
pub fn decode_sprite_row(
    vram: &Vram, mode: HardwareMode, height: u8, sprite: &Sprite, row: u8,
) -> Result<TileRow, CoreError> {
    if row >= height {
        return Err(CoreError::InvalidTileRow { row });
    }

    let flip = sprite.flip();
    let physical_row = if flip.y { height - row - 1 } else { row };
    let tile = sprite.tile_for_height(height) as u16 + (physical_row / 8) as u16;

    decode_tile_row(
        vram,
        sprite.vram_bank(mode),
        tile,
        physical_row % 8,
        Flip { x: flip.x, y: false },
    )
}

pub fn decode_sprite(vram: &Vram, mode: HardwareMode, lcdc: LcdControl, sprite: &Sprite) -> Result<SpritePixels, CoreError> {
    let height = lcdc.sprite_height();
    let mut rows = [[0; 8]; 16];

    for row in 0..height {
        rows[row as usize] = decode_sprite_row(vram, mode, height, sprite, row)?;
    }

    Ok(SpritePixels { height, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::tile::TILE_BYTES;

    /// Tile `n` gets row `r` = [n, r] in its bitplanes so each row is unique.
    fn numbered_vram(mode: HardwareMode) -> Vram {
        let mut vram = Vram::new(mode);
        for tile in 0..16u16 {
            for row in 0..8u16 {
                let address = tile * TILE_BYTES + row * 2;
                vram.write(0, address, (tile as u8) << 4 | row as u8).unwrap();
                vram.write(0, address + 1, 0b1000_0000).unwrap();
            }
        }
        vram
    }

    #[test]
    fn tall_sprites_mask_tile_bit() {
        let sprite = Sprite::new(0, 16, 8, 5, 0);
        assert_eq!(sprite.tile_for_height(16), 4);
        assert_eq!(sprite.tile_for_height(8), 5);

        let vram = numbered_vram(HardwareMode::Dmg);
        let tall = decode_sprite(&vram, HardwareMode::Dmg, LcdControl::OBJ_SIZE, &sprite).unwrap();
        let top = decode_tile_row(&vram, 0, 4, 0, Flip::NONE).unwrap();
        let bottom = decode_tile_row(&vram, 0, 5, 7, Flip::NONE).unwrap();
        assert_eq!(tall.height(), 16);
        assert_eq!(tall.rows()[0], top);
        assert_eq!(tall.rows()[15], bottom);
    }

    #[test]
    fn vertical_flip_spans_full_height() {
        let vram = numbered_vram(HardwareMode::Dmg);
        let plain = Sprite::new(0, 16, 8, 2, 0);
        let flipped = Sprite::new(0, 16, 8, 2, SpriteAttributes::FLIP_Y.bits());

        let plain = decode_sprite(&vram, HardwareMode::Dmg, LcdControl::OBJ_SIZE, &plain).unwrap();
        let flipped = decode_sprite(&vram, HardwareMode::Dmg, LcdControl::OBJ_SIZE, &flipped).unwrap();
        for y in 0..16 {
            assert_eq!(flipped.rows()[y], plain.rows()[15 - y]);
        }
    }

    #[test]
    fn short_sprites_have_eight_rows() {
        let vram = numbered_vram(HardwareMode::Dmg);
        let sprite = Sprite::new(0, 16, 8, 3, SpriteAttributes::FLIP_X.bits());
        let pixels = decode_sprite(&vram, HardwareMode::Dmg, LcdControl::empty(), &sprite).unwrap();
        assert_eq!(pixels.rows().len(), 8);
        assert_eq!(pixels.pixel(0, 8), None);
        // Flipped, the high plane's bit 7 ends up on the right edge.
        assert_eq!(pixels.pixel(7, 0).map(|c| c & 0b10), Some(0b10));
    }

    #[test]
    fn bank_bit_ignored_outside_cgb() {
        let sprite = Sprite::new(0, 16, 8, 0, SpriteAttributes::BANK.bits() | 0b101);
        assert_eq!(sprite.vram_bank(HardwareMode::Dmg), 0);
        assert_eq!(sprite.vram_bank(HardwareMode::GbcCompat), 0);
        assert_eq!(sprite.vram_bank(HardwareMode::Cgb), 1);
        assert_eq!(sprite.palette(HardwareMode::Cgb), 5);
        assert_eq!(sprite.palette(HardwareMode::Dmg), 0);

        let vram = Vram::new(HardwareMode::Dmg);
        assert!(decode_sprite(&vram, HardwareMode::Dmg, LcdControl::empty(), &sprite).is_ok());
    }

    #[test]
    fn visibility_rules() {
        assert!(Sprite::new(0, 16, 8, 0, 0).is_on_screen(8));
        assert!(!Sprite::new(0, 8, 8, 0, 0).is_on_screen(8));
        assert!(Sprite::new(0, 8, 8, 0, 0).is_on_screen(16));
        assert!(!Sprite::new(0, 16, 0, 0, 0).is_on_screen(8));
        assert!(!Sprite::new(0, 16, 168, 0, 0).is_on_screen(8));
        assert!(!Sprite::new(0, 160, 8, 0, 0).is_on_screen(16));
    }

    #[test]
    fn scanline_coverage() {
        let sprite = Sprite::new(0, 16, 8, 0, 0);
        assert!(sprite.is_visible_on_scanline(0, 8));
        assert!(sprite.is_visible_on_scanline(7, 8));
        assert!(!sprite.is_visible_on_scanline(8, 8));
        assert!(sprite.is_visible_on_scanline(15, 16));
    }
}
