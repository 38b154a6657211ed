use crate::error::CoreError;
use crate::memory::registers::LcdControl;
use crate::memory::vram::{Vram, TILEMAP_0_OFFSET, TILEMAP_1_OFFSET, TILESET_0_OFFSET, TILESET_1_OFFSET};
use bitflags::bitflags;

/// Tiles addressable in one VRAM bank ($8000-$97FF).
pub const TILE_COUNT: u16 = 384;
pub const TILE_BYTES: u16 = 16;

/// One decoded row: eight 2-bit color indices, leftmost first.
pub type TileRow = [u8; 8];

bitflags! {
    /// CGB background map attributes, stored in VRAM bank 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TileAttributes: u8 {
        const PALETTE   = 0b0000_0111;
        const BANK      = 0b0000_1000;
        const FLIP_X    = 0b0010_0000;
        const FLIP_Y    = 0b0100_0000;
        const PRIORITY  = 0b1000_0000;
    }
}

impl From<u8> for TileAttributes {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl TileAttributes {
    pub fn palette(&self) -> u8 {
        (*self & TileAttributes::PALETTE).bits()
    }

    pub fn bank(&self) -> u8 {
        self.contains(TileAttributes::BANK) as u8
    }

    pub fn flip(&self) -> Flip {
        Flip {
            x: self.contains(TileAttributes::FLIP_X),
            y: self.contains(TileAttributes::FLIP_Y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub const NONE: Flip = Flip { x: false, y: false };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMap {
    /// $9800
    Low,
    /// $9C00
    High,
}

impl TileMap {
    pub fn offset(&self) -> u16 {
        match self {
            TileMap::Low => TILEMAP_0_OFFSET,
            TileMap::High => TILEMAP_1_OFFSET,
        }
    }

    pub fn background(lcdc: LcdControl) -> TileMap {
        if lcdc.contains(LcdControl::BG_TILE_MAP) {
            TileMap::High
        } else {
            TileMap::Low
        }
    }

    pub fn window(lcdc: LcdControl) -> TileMap {
        if lcdc.contains(LcdControl::WINDOW_TILE_MAP) {
            TileMap::High
        } else {
            TileMap::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSet {
    /// $8000 base, tile numbers 0-255.
    Unsigned,
    /// $8800 base, tile numbers -128..127 around $9000.
    Signed,
}

impl TileSet {
    pub fn from_lcdc(lcdc: LcdControl) -> TileSet {
        if lcdc.contains(LcdControl::BG_TILE_DATA) {
            TileSet::Unsigned
        } else {
            TileSet::Signed
        }
    }

    /// Index (0-383) of the tile a map entry refers to.
    #[inline]
    pub fn tile_index(&self, tile_number: u8) -> u16 {
        match self {
            TileSet::Unsigned => TILESET_0_OFFSET / TILE_BYTES + tile_number as u16,
            TileSet::Signed => TILESET_1_OFFSET / TILE_BYTES + (tile_number ^ 0x80) as u16,
        }
    }
}

/// A resolved tile map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub tile: u16,
    pub attributes: TileAttributes,
}

/// Look up the cell at (`column`, `row`) of a 32x32 map. Attributes are only
/// read on CGB; elsewhere they are empty.
pub fn map_entry(
    vram: &Vram, map: TileMap, tileset: TileSet, column: u8, row: u8, cgb: bool,
) -> Result<MapEntry, CoreError> {
    let offset = map.offset() + (row as u16 & 31) * 32 + (column as u16 & 31);
    let tile = tileset.tile_index(vram.read(0, offset)?);
    let attributes = if cgb {
        TileAttributes::from(vram.read(1, offset)?)
    } else {
        TileAttributes::empty()
    };

    Ok(MapEntry { tile, attributes })
}

/// Decode one row from its two bitplanes.
///
/// Pixel `x` comes from bit `7 - x`. Horizontal flip mirrors `x` before the
/// bit position is picked, so no array reversal happens afterwards.
#[inline]
pub fn decode_row(lsb: u8, msb: u8, flip_x: bool) -> TileRow {
    let mut row = [0; 8];

    for (x, pixel) in row.iter_mut().enumerate() {
        let source_x = if flip_x { 7 - x } else { x };
        let bit = 7 - source_x;
        let lsb_bit = (lsb >> bit) & 0b0000_0001;
        let msb_bit = (msb >> bit) & 0b0000_0001;
        *pixel = (msb_bit << 1) | lsb_bit;
    }

    row
}

pub fn decode_tile_row(vram: &Vram, bank: u8, tile: u16, row: u8, flip: Flip) -> Result<TileRow, CoreError> {
    if tile >= TILE_COUNT {
        return Err(CoreError::InvalidTileIndex { tile });
    }
    if row >= 8 {
        return Err(CoreError::InvalidTileRow { row });
    }

    let physical_row = if flip.y { 7 - row } else { row };
    let address = tile * TILE_BYTES + physical_row as u16 * 2;
    let (lsb, msb) = vram.read_pair(bank, address)?;

    Ok(decode_row(lsb, msb, flip.x))
}

pub fn decode_tile(vram: &Vram, bank: u8, tile: u16, flip: Flip) -> Result<[TileRow; 8], CoreError> {
    let mut rows = [[0; 8]; 8];
    for (y, row) in rows.iter_mut().enumerate() {
        *row = decode_tile_row(vram, bank, tile, y as u8, flip)?;
    }
    Ok(rows)
}
