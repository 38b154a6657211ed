pub mod extern_ram;
pub mod io;
pub mod mmu;
pub mod oam;
pub mod registers;
pub mod vram;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9fff;
pub const EXTERNAL_RAM_START: u16 = 0xa000;
pub const EXTERNAL_RAM_END: u16 = 0xbfff;
pub const WORK_RAM_START: u16 = 0xc000;
pub const WORK_RAM_END: u16 = 0xdfff;
pub const ECHO_RAM_START: u16 = 0xe000;
pub const ECHO_RAM_END: u16 = 0xfdff;
pub const OAM_START: u16 = 0xfe00;
pub const OAM_END: u16 = 0xfe9f;
pub const UNUSABLE_START: u16 = 0xfea0;
pub const UNUSABLE_END: u16 = 0xfeff;
pub const IO_START: u16 = 0xff00;

pub const JOYPAD_REGISTER: u16 = 0xff00;
pub const INTERRUPT_FLAGS_REGISTER: u16 = 0xff0f;
pub const LCD_CONTROL_REGISTER: u16 = 0xff40;
pub const LCD_STATUS_REGISTER: u16 = 0xff41;
pub const SCROLL_Y_REGISTER: u16 = 0xff42;
pub const SCROLL_X_REGISTER: u16 = 0xff43;
pub const SCANLINE_Y_REGISTER: u16 = 0xff44;
pub const SCANLINE_Y_COMPARE_REGISTER: u16 = 0xff45;
pub const OAM_DMA_REGISTER: u16 = 0xff46;
pub const BG_PALETTE_REGISTER: u16 = 0xff47;
pub const OBJ0_PALETTE_REGISTER: u16 = 0xff48;
pub const OBJ1_PALETTE_REGISTER: u16 = 0xff49;
pub const WINDOW_Y_REGISTER: u16 = 0xff4a;
pub const WINDOW_X_REGISTER: u16 = 0xff4b;
pub const VRAM_BANK_REGISTER: u16 = 0xff4f;
pub const BACKGROUND_PALETTE_INDEX_REGISTER: u16 = 0xff68;
pub const BACKGROUND_PALETTE_DATA_REGISTER: u16 = 0xff69;
pub const OBJECT_PALETTE_INDEX_REGISTER: u16 = 0xff6a;
pub const OBJECT_PALETTE_DATA_REGISTER: u16 = 0xff6b;
pub const INTERRUPT_ENABLE_REGISTER: u16 = 0xffff;

pub const EXTERNAL_RAM_BANK_SIZE: usize = 0x2000;
