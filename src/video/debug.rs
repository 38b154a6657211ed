use crate::error::CoreError;
use crate::memory::extern_ram::{CameraSlot, ExternRam, CAMERA_PHOTO_SLOTS};
use crate::memory::oam::{Oam, OAM_ENTRIES};
use crate::memory::registers::LcdControl;
use crate::memory::vram::Vram;
use crate::video::palette::{Color, PaletteKind, PaletteSource, Shade, DMG_SHADES};
use crate::video::sprite::{decode_sprite, Sprite, SpritePixels};
use crate::video::tile::{decode_row, decode_tile_row, map_entry, Flip, TileMap, TileSet, TILE_BYTES};
use crate::video::{BACKGROUND_HEIGHT, BACKGROUND_WIDTH};

pub const TILE_SHEET_WIDTH: usize = 128;
pub const TILE_SHEET_HEIGHT: usize = 192;
const TILE_SHEET_COLUMNS: u16 = 16;

pub const ZOOMED_TILE_SIZE: usize = 64;

pub const SPRITE_SHEET_SIZE: usize = 256;
const SPRITE_SHEET_COLUMNS: usize = 8;
const SPRITE_CELL_WIDTH: usize = 32;
const SPRITE_CELL_HEIGHT: usize = 52;
const SPRITE_SHEET_MARGIN_X: usize = 8;
const SPRITE_SHEET_MARGIN_Y: usize = 10;

pub const ZOOMED_SPRITE_WIDTH: usize = 64;
pub const ZOOMED_SPRITE_HEIGHT: usize = 128;

pub const CAMERA_THUMBNAIL_SIZE: usize = 32;
pub const CAMERA_PHOTO_WIDTH: usize = 128;
pub const CAMERA_PHOTO_HEIGHT: usize = 112;
pub const CAMERA_ALBUM_WIDTH: usize = 248;
pub const CAMERA_ALBUM_HEIGHT: usize = 208;
const CAMERA_ALBUM_COLUMNS: usize = 6;
const CAMERA_ALBUM_SPACING: usize = 40;
const CAMERA_ALBUM_MARGIN: usize = 8;

/// Marks pixels of sprites that are off screen.
pub const HIDDEN_SPRITE_MARK: Color = [255, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// A caller-owned pixel buffer. `stride` is in pixels.
pub struct Surface<'a> {
    buffer: &'a mut [u8],
    stride: usize,
    format: PixelFormat,
}

impl<'a> Surface<'a> {
    pub fn new(buffer: &'a mut [u8], stride: usize, format: PixelFormat) -> Surface<'a> {
        Surface { buffer, stride, format }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes of the pixel at (`x`, `y`), or `None` outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        let bpp = self.format.bytes_per_pixel();
        let start = (y * self.stride + x) * bpp;
        self.buffer.get(start..start + bpp)
    }

    /// Check that a `width` x `height` area at (`x`, `y`) fits before
    /// anything is drawn, so a failed call leaves the buffer untouched.
    fn claim(&self, x: usize, y: usize, width: usize, height: usize) -> Result<(), CoreError> {
        let actual = self.buffer.len();
        if width == 0 || height == 0 {
            return Ok(());
        }
        if x + width > self.stride {
            return Err(CoreError::SurfaceTooSmall {
                required: (y + height) * (x + width) * self.format.bytes_per_pixel(),
                actual,
            });
        }

        let required = ((y + height - 1) * self.stride + x + width) * self.format.bytes_per_pixel();
        if required > actual {
            return Err(CoreError::SurfaceTooSmall { required, actual });
        }
        Ok(())
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, color: Color) {
        let bpp = self.format.bytes_per_pixel();
        let start = (y * self.stride + x) * bpp;
        if let Some(pixel) = self.buffer.get_mut(start..start + bpp) {
            pixel[..3].copy_from_slice(&color);
            if let Some(alpha) = pixel.get_mut(3) {
                *alpha = 0xff;
            }
        }
    }

    /// Fully transparent on RGBA surfaces. RGB surfaces have no way to
    /// say transparent, so the pixel is left as it was.
    #[inline]
    fn clear(&mut self, x: usize, y: usize) {
        if self.format == PixelFormat::Rgb {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = (y * self.stride + x) * bpp;
        if let Some(pixel) = self.buffer.get_mut(start..start + bpp) {
            pixel.fill(0);
        }
    }

    fn fill_checker(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for dy in 0..height {
            for dx in 0..width {
                let gray = if (dx ^ dy) & 4 != 0 { 192 } else { 128 };
                self.put(x + dx, y + dy, [gray, gray, gray]);
            }
        }
    }
}

/// How a tile view colors its pixels.
#[derive(Clone, Copy)]
pub enum TileColors<'a> {
    /// Color indices shown as the four DMG grays.
    Raw,
    /// Through a palette. Outside CGB mode this is always BGP in DMG grays,
    /// whatever table the screen itself is colored with.
    Palette {
        source: &'a PaletteSource<'a>,
        kind: PaletteKind,
        palette: u8,
    },
}

impl TileColors<'_> {
    fn color(&self, color: u8) -> Color {
        match self {
            TileColors::Raw => DMG_SHADES[(color & 0b11) as usize],
            TileColors::Palette { source, kind, palette } => match source {
                PaletteSource::Cgb(_) => source.resolve(*kind, *palette, color),
                PaletteSource::Dmg(registers)
                | PaletteSource::Compat { registers, .. }
                | PaletteSource::Sgb { registers, .. } => {
                    DMG_SHADES[Shade::from_register(registers.bgp, color).index() as usize]
                }
            },
        }
    }
}

/// All 384 tiles of one VRAM bank, 16 per row.
pub fn draw_tile_sheet(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, bank: u8, colors: TileColors,
) -> Result<(), CoreError> {
    surface.claim(x, y, TILE_SHEET_WIDTH, TILE_SHEET_HEIGHT)?;
    vram.bank(bank)?;

    for py in 0..TILE_SHEET_HEIGHT {
        for tx in 0..TILE_SHEET_COLUMNS {
            let tile = tx + (py as u16 >> 3) * TILE_SHEET_COLUMNS;
            let row = decode_tile_row(vram, bank, tile, (py & 7) as u8, Flip::NONE)?;
            for (px, color) in row.iter().enumerate() {
                surface.put(x + tx as usize * 8 + px, y + py, colors.color(*color));
            }
        }
    }

    Ok(())
}

/// One tile blown up 8 times.
pub fn draw_tile_zoomed(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, bank: u8, tile: u16, colors: TileColors,
) -> Result<(), CoreError> {
    surface.claim(x, y, ZOOMED_TILE_SIZE, ZOOMED_TILE_SIZE)?;

    for row in 0..8u8 {
        let pixels = decode_tile_row(vram, bank, tile, row, Flip::NONE)?;
        for (column, color) in pixels.iter().enumerate() {
            let rgb = colors.color(*color);
            for py in 0..8 {
                for px in 0..8 {
                    surface.put(x + column * 8 + px, y + row as usize * 8 + py, rgb);
                }
            }
        }
    }

    Ok(())
}

/// How a map view colors its pixels.
#[derive(Clone, Copy)]
pub enum MapColors<'a> {
    /// DMG grays straight from the color index. CGB attributes still pick
    /// the bank and flips.
    Raw,
    Palette(&'a PaletteSource<'a>),
}

/// The full 32x32 tile map as a 256x256 image.
pub fn draw_tile_map(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, map: TileMap, tileset: TileSet, colors: MapColors,
) -> Result<(), CoreError> {
    surface.claim(x, y, BACKGROUND_WIDTH, BACKGROUND_HEIGHT)?;
    let cgb = vram.mode().is_cgb();

    for row in 0..32u8 {
        for column in 0..32u8 {
            let entry = map_entry(vram, map, tileset, column, row, cgb)?;
            let attributes = entry.attributes;
            for line in 0..8u8 {
                let pixels = decode_tile_row(vram, attributes.bank(), entry.tile, line, attributes.flip())?;
                for (px, color) in pixels.iter().enumerate() {
                    let rgb = match colors {
                        MapColors::Raw => DMG_SHADES[*color as usize],
                        MapColors::Palette(source) => source.resolve_background(attributes, *color),
                    };
                    surface.put(x + column as usize * 8 + px, y + row as usize * 8 + line as usize, rgb);
                }
            }
        }
    }

    Ok(())
}

fn sprite_color(source: &PaletteSource, vram: &Vram, sprite: &Sprite, color: u8) -> Color {
    source.resolve(PaletteKind::Object, sprite.palette(vram.mode()), color)
}

fn decode_entry(vram: &Vram, oam: &Oam, lcdc: LcdControl, index: usize) -> Result<(Sprite, SpritePixels), CoreError> {
    let sprite = oam.entry(index)?;
    let pixels = decode_sprite(vram, vram.mode(), lcdc, &sprite)?;
    Ok((sprite, pixels))
}

fn hidden_mark(x: usize, y: usize) -> bool {
    (x ^ y) & 3 == 0
}

/// One OAM entry at twice its size. Color 0 is left alone; off-screen
/// sprites get a red dot pattern over them.
pub fn draw_sprite(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, oam: &Oam, lcdc: LcdControl, index: usize,
    source: &PaletteSource,
) -> Result<(), CoreError> {
    let (sprite, pixels) = decode_entry(vram, oam, lcdc, index)?;
    let height = pixels.height() as usize;
    surface.claim(x, y, 16, height * 2)?;

    let visible = sprite.is_on_screen(pixels.height());
    for (row, colors) in pixels.rows().iter().enumerate() {
        for (column, color) in colors.iter().enumerate() {
            for i in 0..2 {
                for j in 0..2 {
                    let (sx, sy) = (column * 2 + i, row * 2 + j);
                    if !visible && hidden_mark(sx, sy) {
                        surface.put(x + sx, y + sy, HIDDEN_SPRITE_MARK);
                    } else if *color != 0 {
                        surface.put(x + sx, y + sy, sprite_color(source, vram, &sprite, *color));
                    }
                }
            }
        }
    }

    Ok(())
}

fn sprite_cell(index: usize) -> (usize, usize) {
    (
        SPRITE_SHEET_MARGIN_X + (index % SPRITE_SHEET_COLUMNS) * SPRITE_CELL_WIDTH,
        SPRITE_SHEET_MARGIN_Y + (index / SPRITE_SHEET_COLUMNS) * SPRITE_CELL_HEIGHT,
    )
}

/// All 40 sprites, eight per row, over a checkerboard.
pub fn draw_sprite_sheet(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, oam: &Oam, lcdc: LcdControl, source: &PaletteSource,
) -> Result<(), CoreError> {
    surface.claim(x, y, SPRITE_SHEET_SIZE, SPRITE_SHEET_SIZE)?;
    surface.fill_checker(x, y, SPRITE_SHEET_SIZE, SPRITE_SHEET_SIZE);

    for index in 0..OAM_ENTRIES {
        let (cx, cy) = sprite_cell(index);
        draw_sprite(surface, x + cx, y + cy, vram, oam, lcdc, index, source)?;
    }

    Ok(())
}

/// One sprite at its real size with color 0 cleared to transparent.
pub fn draw_sprite_alpha(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, oam: &Oam, lcdc: LcdControl, index: usize,
    source: &PaletteSource,
) -> Result<(), CoreError> {
    let (sprite, pixels) = decode_entry(vram, oam, lcdc, index)?;
    surface.claim(x, y, 8, pixels.height() as usize)?;

    for (row, colors) in pixels.rows().iter().enumerate() {
        for (column, color) in colors.iter().enumerate() {
            if *color == 0 {
                surface.clear(x + column, y + row);
            } else {
                surface.put(x + column, y + row, sprite_color(source, vram, &sprite, *color));
            }
        }
    }

    Ok(())
}

/// The sprite sheet layout, sprites at 2x. RGBA surfaces get a transparent
/// background; RGB surfaces keep what was under it.
pub fn draw_sprite_sheet_alpha(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, oam: &Oam, lcdc: LcdControl, source: &PaletteSource,
) -> Result<(), CoreError> {
    surface.claim(x, y, SPRITE_SHEET_SIZE, SPRITE_SHEET_SIZE)?;
    for py in 0..SPRITE_SHEET_SIZE {
        for px in 0..SPRITE_SHEET_SIZE {
            surface.clear(x + px, y + py);
        }
    }

    for index in 0..OAM_ENTRIES {
        let (sprite, pixels) = decode_entry(vram, oam, lcdc, index)?;
        let (cx, cy) = sprite_cell(index);
        for (row, colors) in pixels.rows().iter().enumerate() {
            for (column, color) in colors.iter().enumerate() {
                if *color == 0 {
                    continue;
                }
                let rgb = sprite_color(source, vram, &sprite, *color);
                for i in 0..2 {
                    for j in 0..2 {
                        surface.put(x + cx + column * 2 + i, y + cy + row * 2 + j, rgb);
                    }
                }
            }
        }
    }

    Ok(())
}

/// One sprite at 8x over a 64x128 checkerboard.
pub fn draw_sprite_zoomed(
    surface: &mut Surface, x: usize, y: usize, vram: &Vram, oam: &Oam, lcdc: LcdControl, index: usize,
    source: &PaletteSource,
) -> Result<(), CoreError> {
    surface.claim(x, y, ZOOMED_SPRITE_WIDTH, ZOOMED_SPRITE_HEIGHT)?;
    let (sprite, pixels) = decode_entry(vram, oam, lcdc, index)?;
    surface.fill_checker(x, y, ZOOMED_SPRITE_WIDTH, ZOOMED_SPRITE_HEIGHT);

    for (row, colors) in pixels.rows().iter().enumerate() {
        for (column, color) in colors.iter().enumerate() {
            if *color == 0 {
                continue;
            }
            let rgb = sprite_color(source, vram, &sprite, *color);
            for py in 0..8 {
                for px in 0..8 {
                    surface.put(x + column * 8 + px, y + row * 8 + py, rgb);
                }
            }
        }
    }

    Ok(())
}

/// Draw `tiles_wide` x `tiles_high` tiles of camera image data stored
/// linearly in cartridge RAM from `base`.
fn draw_camera_image(
    surface: &mut Surface, x: usize, y: usize, ram: &ExternRam, base: u32, tiles_wide: usize, tiles_high: usize,
) -> Result<(), CoreError> {
    surface.claim(x, y, tiles_wide * 8, tiles_high * 8)?;

    for py in 0..tiles_high * 8 {
        for tx in 0..tiles_wide {
            let tile = (py / 8) * tiles_wide + tx;
            let address = base + (tile as u32 * TILE_BYTES as u32) + (py as u32 & 7) * 2;
            let lsb = ram.read_flat(address)?;
            let msb = ram.read_flat(address + 1)?;
            let row = decode_row(lsb, msb, false);
            for (px, color) in row.iter().enumerate() {
                surface.put(x + tx * 8 + px, y + py, DMG_SHADES[*color as usize]);
            }
        }
    }

    Ok(())
}

pub fn draw_camera_thumbnail(
    surface: &mut Surface, x: usize, y: usize, ram: &ExternRam, slot: CameraSlot,
) -> Result<(), CoreError> {
    let tiles = CAMERA_THUMBNAIL_SIZE / 8;
    draw_camera_image(surface, x, y, ram, slot.thumbnail_address()?, tiles, tiles)
}

pub fn draw_camera_photo(
    surface: &mut Surface, x: usize, y: usize, ram: &ExternRam, slot: CameraSlot,
) -> Result<(), CoreError> {
    draw_camera_image(
        surface,
        x,
        y,
        ram,
        slot.photo_address(),
        CAMERA_PHOTO_WIDTH / 8,
        CAMERA_PHOTO_HEIGHT / 8,
    )
}

/// Every album thumbnail, six per row, over a checkerboard.
pub fn draw_camera_album(surface: &mut Surface, x: usize, y: usize, ram: &ExternRam) -> Result<(), CoreError> {
    surface.claim(x, y, CAMERA_ALBUM_WIDTH, CAMERA_ALBUM_HEIGHT)?;
    surface.fill_checker(x, y, CAMERA_ALBUM_WIDTH, CAMERA_ALBUM_HEIGHT);

    for slot in 0..CAMERA_PHOTO_SLOTS as usize {
        let tx = (slot % CAMERA_ALBUM_COLUMNS) * CAMERA_ALBUM_SPACING + CAMERA_ALBUM_MARGIN;
        let ty = (slot / CAMERA_ALBUM_COLUMNS) * CAMERA_ALBUM_SPACING + CAMERA_ALBUM_MARGIN;
        draw_camera_thumbnail(surface, x + tx, y + ty, ram, CameraSlot::Photo(slot as u8))?;
    }

    Ok(())
}
