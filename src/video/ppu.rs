use crate::error::CoreError;
use crate::memory::mmu::Mmu;
use crate::memory::registers::{InterruptFlags, LcdControl, LcdStatus};
use crate::memory::vram::Vram;
use crate::memory::{
    LCD_CONTROL_REGISTER, LCD_STATUS_REGISTER, SCANLINE_Y_COMPARE_REGISTER, SCANLINE_Y_REGISTER, SCROLL_X_REGISTER,
    SCROLL_Y_REGISTER, WINDOW_X_REGISTER, WINDOW_Y_REGISTER,
};
use crate::sgb::command::ScreenMask;
use crate::sgb::Sgb;
use crate::video::compat::CompatPalette;
use crate::video::palette::{rgb555_to_color, Color, PaletteKind, PaletteSource, BLACK, DMG_SHADES};
use crate::video::sprite::{decode_sprite_row, Sprite};
use crate::video::state::{State, LINES_PER_FRAME, VISIBLE_LINES};
use crate::video::tile::{decode_tile_row, map_entry, TileAttributes, TileMap, TileSet};
use crate::video::{MAX_SPRITES_PER_LINE, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{debug, trace};

pub type Frame = [[Color; SCREEN_WIDTH]; SCREEN_HEIGHT];

const WHITE: Color = DMG_SHADES[0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuEvent {
    HBlank,
    VBlank,
}

/// Everything besides the bus that decides pixel colors.
#[derive(Clone, Copy)]
pub struct ColorSources<'a> {
    pub compat: &'a dyn CompatPalette,
    pub sgb: Option<&'a Sgb>,
}

#[derive(Clone)]
pub struct Ppu {
    state: State,
    dots: u32,
    window_line: u8,
    stat_line: bool,
    lcd_on: bool,
    working: Box<Frame>,
    frame: Box<Frame>,
    frames: u64,
}

impl Ppu {
    pub fn new() -> Ppu {
        Ppu {
            state: State::OamScan,
            dots: 0,
            window_line: 0,
            stat_line: false,
            lcd_on: true,
            working: Box::new([[WHITE; SCREEN_WIDTH]; SCREEN_HEIGHT]),
            frame: Box::new([[WHITE; SCREEN_WIDTH]; SCREEN_HEIGHT]),
            frames: 0,
        }
    }

    /// The last completed frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(&mut self, mmu: &mut Mmu, colors: ColorSources, cycles: u32) -> Result<Vec<PpuEvent>, CoreError> {
        let mut events = Vec::new();
        let lcdc = LcdControl::from(mmu.io_register(LCD_CONTROL_REGISTER));

        if !lcdc.contains(LcdControl::LCD_DISPLAY) {
            if self.lcd_on {
                self.switch_off(mmu);
            }
            return Ok(events);
        }

        if !self.lcd_on {
            debug!("PPU: LCD switched on");
            self.lcd_on = true;
            self.state = State::OamScan;
            self.dots = 0;
        }

        let mut remaining = cycles;
        while remaining > 0 {
            let step = remaining.min(self.state.duration() - self.dots);
            self.dots += step;
            remaining -= step;

            if self.dots == self.state.duration() {
                self.dots = 0;
                self.advance(mmu, colors, &mut events)?;
            }
        }

        self.update_stat(mmu);
        Ok(events)
    }

    fn advance(&mut self, mmu: &mut Mmu, colors: ColorSources, events: &mut Vec<PpuEvent>) -> Result<(), CoreError> {
        match self.state {
            State::OamScan => self.state = State::Drawing,
            State::Drawing => {
                self.render_line(mmu, colors)?;
                self.state = State::HBlank;
                events.push(PpuEvent::HBlank);
            }
            State::HBlank => {
                if self.next_line(mmu) == VISIBLE_LINES {
                    self.state = State::VBlank;
                    mmu.request_interrupt(InterruptFlags::VBLANK);
                    self.present(colors);
                    events.push(PpuEvent::VBlank);
                } else {
                    self.state = State::OamScan;
                }
            }
            State::VBlank => {
                if self.next_line(mmu) == 0 {
                    self.window_line = 0;
                    self.state = State::OamScan;
                }
            }
        }

        self.update_stat(mmu);
        Ok(())
    }

    fn next_line(&mut self, mmu: &mut Mmu) -> u8 {
        let ly = mmu.io_register(SCANLINE_Y_REGISTER).wrapping_add(1) % LINES_PER_FRAME;
        mmu.set_io_register(SCANLINE_Y_REGISTER, ly);
        ly
    }

    fn switch_off(&mut self, mmu: &mut Mmu) {
        debug!("PPU: LCD switched off");
        self.lcd_on = false;
        self.state = State::HBlank;
        self.dots = 0;
        self.window_line = 0;
        self.stat_line = false;
        mmu.set_io_register(SCANLINE_Y_REGISTER, 0);
        self.update_stat(mmu);
        *self.frame = [[WHITE; SCREEN_WIDTH]; SCREEN_HEIGHT];
    }

    fn update_stat(&mut self, mmu: &mut Mmu) {
        let ly = mmu.io_register(SCANLINE_Y_REGISTER);
        let lyc = mmu.io_register(SCANLINE_Y_COMPARE_REGISTER);
        let mut stat = LcdStatus::from(mmu.io_register(LCD_STATUS_REGISTER));

        stat.remove(LcdStatus::MODE);
        stat.insert(LcdStatus::from_bits_truncate(self.state.as_u8()));
        stat.set(LcdStatus::COINCIDENCE, ly == lyc);
        mmu.set_io_register(LCD_STATUS_REGISTER, stat.bits());

        if !self.lcd_on {
            return;
        }

        let mode_line = self.state.stat_source().map_or(false, |source| stat.contains(source));
        let line = mode_line || stat.contains(LcdStatus::COINCIDENCE_INTERRUPT | LcdStatus::COINCIDENCE);
        if line && !self.stat_line {
            trace!("PPU: STAT interrupt at LY {}", ly);
            mmu.request_interrupt(InterruptFlags::LCD_STAT);
        }
        self.stat_line = line;
    }

    /// Hand the finished frame over, honoring the SGB screen mask.
    fn present(&mut self, colors: ColorSources) {
        self.frames += 1;

        match colors.sgb {
            Some(sgb) => match sgb.mask() {
                ScreenMask::None => *self.frame = *self.working,
                ScreenMask::Freeze => {}
                ScreenMask::Black => *self.frame = [[BLACK; SCREEN_WIDTH]; SCREEN_HEIGHT],
                ScreenMask::Backdrop => {
                    let backdrop = rgb555_to_color(sgb.palettes().backdrop());
                    *self.frame = [[backdrop; SCREEN_WIDTH]; SCREEN_HEIGHT];
                }
            },
            None => *self.frame = *self.working,
        }
    }

    fn render_line(&mut self, mmu: &Mmu, colors: ColorSources) -> Result<(), CoreError> {
        let ly = mmu.io_register(SCANLINE_Y_REGISTER);
        if ly >= VISIBLE_LINES {
            return Ok(());
        }

        let lcdc = LcdControl::from(mmu.io_register(LCD_CONTROL_REGISTER));
        let mode = mmu.mode();
        let cgb = mode.is_cgb();
        let vram = mmu.vram();
        let palettes = PaletteSource::from_mmu(mmu, colors.compat, colors.sgb.map(|sgb| sgb.palettes()));
        let region = |x: usize| colors.sgb.map_or(0, |sgb| sgb.palette_at(x, ly as usize));

        // Color index and CGB priority bit behind each pixel, for sprite priority.
        let mut bg_colors = [0u8; SCREEN_WIDTH];
        let mut bg_priority = [false; SCREEN_WIDTH];
        let line = &mut self.working[ly as usize];

        // In CGB mode LCDC.0 only drops background priority.
        let background = cgb || lcdc.contains(LcdControl::BG_DISPLAY);
        let tileset = TileSet::from_lcdc(lcdc);

        if background {
            let scx = mmu.io_register(SCROLL_X_REGISTER);
            let y = ly.wrapping_add(mmu.io_register(SCROLL_Y_REGISTER));
            let map = TileMap::background(lcdc);

            for (x, pixel) in line.iter_mut().enumerate() {
                let (color, attributes) = map_pixel(vram, map, tileset, cgb, (x as u8).wrapping_add(scx), y)?;
                *pixel = background_color(&palettes, attributes, color, region(x));
                bg_colors[x] = color;
                bg_priority[x] = attributes.contains(TileAttributes::PRIORITY);
            }
        } else {
            *line = [WHITE; SCREEN_WIDTH];
        }

        let wy = mmu.io_register(WINDOW_Y_REGISTER);
        let wx = mmu.io_register(WINDOW_X_REGISTER);
        if background && lcdc.contains(LcdControl::WINDOW_DISPLAY) && wy <= ly && wx <= 166 {
            let map = TileMap::window(lcdc);
            for x in 0..SCREEN_WIDTH {
                if x + 7 < wx as usize {
                    continue;
                }
                let window_x = (x + 7 - wx as usize) as u8;
                let (color, attributes) = map_pixel(vram, map, tileset, cgb, window_x, self.window_line)?;
                line[x] = background_color(&palettes, attributes, color, region(x));
                bg_colors[x] = color;
                bg_priority[x] = attributes.contains(TileAttributes::PRIORITY);
            }
            self.window_line += 1;
        }

        if !lcdc.contains(LcdControl::OBJ_DISPLAY) {
            return Ok(());
        }

        let height = lcdc.sprite_height();
        let mut sprites: Vec<Sprite> = mmu
            .oam()
            .sprites()
            .filter(|sprite| sprite.is_visible_on_scanline(ly, height))
            .take(MAX_SPRITES_PER_LINE)
            .collect();
        // Outside CGB mode the leftmost sprite wins, OAM order breaks ties.
        if !cgb {
            sprites.sort_by_key(|sprite| (sprite.x, sprite.index));
        }

        let mut claimed = [false; SCREEN_WIDTH];
        for sprite in &sprites {
            let row = (ly as i16 - sprite.screen_y()) as u8;
            let pixels = decode_sprite_row(vram, mode, height, sprite, row)?;

            for (i, &color) in pixels.iter().enumerate() {
                let x = sprite.screen_x() + i as i16;
                if color == 0 || !(0..SCREEN_WIDTH as i16).contains(&x) {
                    continue;
                }
                let x = x as usize;
                if claimed[x] {
                    continue;
                }
                claimed[x] = true;

                let hidden = bg_colors[x] != 0
                    && if cgb {
                        lcdc.contains(LcdControl::BG_DISPLAY) && (bg_priority[x] || sprite.behind_background())
                    } else {
                        sprite.behind_background()
                    };
                if !hidden {
                    line[x] = palettes.resolve_in_region(PaletteKind::Object, sprite.palette(mode), color, region(x));
                }
            }
        }

        Ok(())
    }
}

impl Default for Ppu {
    fn default() -> Ppu {
        Ppu::new()
    }
}

fn map_pixel(
    vram: &Vram, map: TileMap, tileset: TileSet, cgb: bool, x: u8, y: u8,
) -> Result<(u8, TileAttributes), CoreError> {
    let entry = map_entry(vram, map, tileset, x / 8, y / 8, cgb)?;
    let row = decode_tile_row(vram, entry.attributes.bank(), entry.tile, y % 8, entry.attributes.flip())?;
    Ok((row[(x % 8) as usize], entry.attributes))
}

fn background_color(palettes: &PaletteSource, attributes: TileAttributes, color: u8, region: u8) -> Color {
    if palettes.is_cgb() {
        palettes.resolve_background(attributes, color)
    } else {
        palettes.resolve_in_region(PaletteKind::Background, 0, color, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HardwareMode, SgbConfig};
    use crate::memory::{BG_PALETTE_REGISTER, INTERRUPT_FLAGS_REGISTER, OBJ0_PALETTE_REGISTER};
    use crate::video::compat::CompatPaletteTable;
    use crate::video::sprite::SpriteAttributes;

    const LINE: u32 = 456;
    const FRAME: u32 = LINE * LINES_PER_FRAME as u32;

    fn solid_tile(mmu: &mut Mmu, tile: u16, lsb: u8, msb: u8) {
        for row in 0..8 {
            mmu.write(0x8000 + tile * 16 + row * 2, lsb).unwrap();
            mmu.write(0x8000 + tile * 16 + row * 2 + 1, msb).unwrap();
        }
    }

    fn run(ppu: &mut Ppu, mmu: &mut Mmu, sgb: Option<&Sgb>, cycles: u32) -> Vec<PpuEvent> {
        let table = CompatPaletteTable::default();
        let colors = ColorSources { compat: &table, sgb };
        ppu.tick(mmu, colors, cycles).unwrap()
    }

    #[test]
    fn ly_walks_every_line_and_raises_vblank() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        mmu.write(INTERRUPT_FLAGS_REGISTER, 0).unwrap();

        for expected in 1..LINES_PER_FRAME as u32 {
            let events = run(&mut ppu, &mut mmu, None, LINE);
            assert_eq!(mmu.read(SCANLINE_Y_REGISTER), Ok(expected as u8));
            assert_eq!(events.contains(&PpuEvent::VBlank), expected == 144);
            assert_eq!(mmu.read(INTERRUPT_FLAGS_REGISTER).unwrap() & 1 != 0, expected >= 144);
        }

        run(&mut ppu, &mut mmu, None, LINE);
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), Ok(0));
        assert_eq!(ppu.state(), State::OamScan);
        assert_eq!(ppu.frames(), 1);
    }

    #[test]
    fn modes_follow_dot_counts() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();

        run(&mut ppu, &mut mmu, None, 79);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER).unwrap() & 0b11, 2);
        run(&mut ppu, &mut mmu, None, 1);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER).unwrap() & 0b11, 3);
        run(&mut ppu, &mut mmu, None, 172);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER).unwrap() & 0b11, 0);
    }

    #[test]
    fn lyc_coincidence_interrupt() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        mmu.write(INTERRUPT_FLAGS_REGISTER, 0).unwrap();
        mmu.write(SCANLINE_Y_COMPARE_REGISTER, 3).unwrap();
        mmu.write(LCD_STATUS_REGISTER, LcdStatus::COINCIDENCE_INTERRUPT.bits()).unwrap();

        run(&mut ppu, &mut mmu, None, LINE * 2);
        assert_eq!(mmu.read(INTERRUPT_FLAGS_REGISTER).unwrap() & 0b10, 0);
        run(&mut ppu, &mut mmu, None, LINE);
        assert_eq!(mmu.read(INTERRUPT_FLAGS_REGISTER).unwrap() & 0b10, 0b10);
        assert!(mmu.read(LCD_STATUS_REGISTER).unwrap() & LcdStatus::COINCIDENCE.bits() != 0);
    }

    #[test]
    fn lcd_off_resets_line_and_whites_frame() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        solid_tile(&mut mmu, 0, 0xff, 0xff);
        mmu.write(BG_PALETTE_REGISTER, 0b1110_0100).unwrap();
        run(&mut ppu, &mut mmu, None, FRAME);
        assert_eq!(ppu.frame()[0][0], BLACK);

        run(&mut ppu, &mut mmu, None, LINE * 10);
        mmu.write(LCD_CONTROL_REGISTER, 0x11).unwrap();
        run(&mut ppu, &mut mmu, None, LINE);
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), Ok(0));
        assert_eq!(mmu.read(LCD_STATUS_REGISTER).unwrap() & 0b11, 0);
        assert_eq!(ppu.frame()[100][100], WHITE);
    }

    #[test]
    fn sprite_color_zero_is_transparent() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        // Background tile 0 is color 1, sprite tile 1 is color 3 on the left half only.
        solid_tile(&mut mmu, 0, 0xff, 0x00);
        solid_tile(&mut mmu, 1, 0xf0, 0xf0);
        mmu.write(BG_PALETTE_REGISTER, 0b1110_0100).unwrap();
        mmu.write(OBJ0_PALETTE_REGISTER, 0b1110_0100).unwrap();
        mmu.write(LCD_CONTROL_REGISTER, 0x93).unwrap();
        mmu.oam_mut().set_entry(0, &Sprite::new(0, 16, 8, 1, 0)).unwrap();

        run(&mut ppu, &mut mmu, None, FRAME);
        assert_eq!(ppu.frame()[0][0], DMG_SHADES[3]);
        assert_eq!(ppu.frame()[0][7], DMG_SHADES[1]);
        assert_eq!(ppu.frame()[8][0], DMG_SHADES[1]);
    }

    #[test]
    fn dmg_sprite_priority_by_x_and_bg() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        solid_tile(&mut mmu, 1, 0xff, 0x00);
        solid_tile(&mut mmu, 2, 0x00, 0xff);
        mmu.write(BG_PALETTE_REGISTER, 0b1110_0100).unwrap();
        mmu.write(OBJ0_PALETTE_REGISTER, 0b1110_0100).unwrap();
        mmu.write(LCD_CONTROL_REGISTER, 0x93).unwrap();
        // Later in OAM but further left, so it wins the overlap.
        mmu.oam_mut().set_entry(0, &Sprite::new(0, 16, 12, 1, 0)).unwrap();
        mmu.oam_mut().set_entry(1, &Sprite::new(1, 16, 10, 2, 0)).unwrap();
        // Behind a color 0 background, so it still shows.
        mmu.oam_mut()
            .set_entry(2, &Sprite::new(2, 40, 40, 1, SpriteAttributes::PRIORITY.bits()))
            .unwrap();

        run(&mut ppu, &mut mmu, None, FRAME);
        assert_eq!(ppu.frame()[0][5], DMG_SHADES[2]);
        assert_eq!(ppu.frame()[0][10], DMG_SHADES[1]);
        assert_eq!(ppu.frame()[24][32], DMG_SHADES[1]);
    }

    #[test]
    fn window_covers_background() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        solid_tile(&mut mmu, 1, 0xff, 0xff);
        // Window map at $9C00 uses tile 1.
        for i in 0..0x400 {
            mmu.write(0x9c00 + i, 1).unwrap();
        }
        mmu.write(BG_PALETTE_REGISTER, 0b1110_0100).unwrap();
        mmu.write(WINDOW_Y_REGISTER, 100).unwrap();
        mmu.write(WINDOW_X_REGISTER, 87).unwrap();
        mmu.write(LCD_CONTROL_REGISTER, 0xf1).unwrap();

        run(&mut ppu, &mut mmu, None, FRAME);
        assert_eq!(ppu.frame()[99][100], WHITE);
        assert_eq!(ppu.frame()[100][79], WHITE);
        assert_eq!(ppu.frame()[100][80], BLACK);
    }

    #[test]
    fn sgb_mask_and_regions() {
        let mut mmu = Mmu::new(HardwareMode::Dmg, 1);
        let mut ppu = Ppu::new();
        let mut sgb = Sgb::new(SgbConfig::default());
        mmu.write(BG_PALETTE_REGISTER, 0b1110_0100).unwrap();

        run(&mut ppu, &mut mmu, Some(&sgb), FRAME);
        assert_eq!(ppu.frame()[0][0], rgb555_to_color(0x7fff));

        // MASK_EN black.
        let mut packet = [0u8; 16];
        packet[0] = 0x17 << 3 | 1;
        packet[1] = 2;
        sgb.write_p1(0x00);
        sgb.write_p1(0x30);
        for byte in packet {
            for bit in 0..8 {
                sgb.write_p1(if byte >> bit & 1 != 0 { 0x10 } else { 0x20 });
                sgb.write_p1(0x30);
            }
        }

        run(&mut ppu, &mut mmu, Some(&sgb), FRAME);
        assert_eq!(ppu.frame()[0][0], BLACK);
    }

    #[test]
    fn cgb_background_uses_attributes() {
        let mut mmu = Mmu::new(HardwareMode::Cgb, 1);
        let mut ppu = Ppu::new();
        mmu.write(0xff4f, 1).unwrap();
        // Attribute palette 2 and bank 1 for every cell.
        for i in 0..0x400 {
            mmu.write(0x9800 + i, 0b0000_1010).unwrap();
        }
        solid_tile(&mut mmu, 0, 0xff, 0x00);
        mmu.write(0xff68, 0x80 | (2 * 8 + 2)).unwrap();
        mmu.write(0xff69, 0x00).unwrap();
        mmu.write(0xff69, 0x7c).unwrap();

        run(&mut ppu, &mut mmu, None, FRAME);
        assert_eq!(ppu.frame()[0][0], [0, 0, 248]);
    }
}
