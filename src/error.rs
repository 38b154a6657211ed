use crate::config::HardwareMode;
use snafu::prelude::*;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CoreError {
    #[snafu(display("VRAM bank {} is not available on {} hardware", bank, mode))]
    InvalidVramBank { bank: u8, mode: HardwareMode },
    #[snafu(display("VRAM offset out of range: ${:04x}", offset))]
    VramOffsetOutOfRange { offset: u16 },
    #[snafu(display("Invalid OAM entry index: {}", index))]
    InvalidOamIndex { index: usize },
    #[snafu(display("OAM offset out of range: ${:02x}", offset))]
    OamOffsetOutOfRange { offset: u16 },
    #[snafu(display("External RAM bank {} out of range ({} banks present)", bank, banks))]
    InvalidExternRamBank { bank: usize, banks: usize },
    #[snafu(display("External RAM offset out of range: ${:04x}", offset))]
    ExternRamOffsetOutOfRange { offset: u16 },
    #[snafu(display("Invalid I/O register: ${:04x}", register))]
    InvalidIoRegister { register: u16 },
    #[snafu(display("Invalid tile index: {}", tile))]
    InvalidTileIndex { tile: u16 },
    #[snafu(display("Invalid tile row: {}", row))]
    InvalidTileRow { row: u8 },
    #[snafu(display("Invalid camera photo slot: {}", index))]
    InvalidCameraSlot { index: i32 },
    #[snafu(display("Surface too small: need {} bytes, got {}", required, actual))]
    SurfaceTooSmall { required: usize, actual: usize },
    #[snafu(display("Invalid configuration: {}", reason))]
    InvalidConfiguration { reason: String },
}
