pub mod compat;
pub mod cram;
pub mod debug;
pub mod palette;
pub mod ppu;
pub mod sprite;
pub mod state;
pub mod tile;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const BACKGROUND_WIDTH: usize = 256;
pub const BACKGROUND_HEIGHT: usize = 256;

pub const MAX_SPRITES_PER_LINE: usize = 10;
