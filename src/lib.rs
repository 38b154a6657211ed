pub mod config;
pub mod error;
pub mod gameboy;
pub mod joypad;
pub mod logging;
pub mod memory;
pub mod sgb;
pub mod video;


pub use config::{EmulatorConfig, HardwareMode, SgbConfig};
pub use error::CoreError;
pub use gameboy::GameBoy;
