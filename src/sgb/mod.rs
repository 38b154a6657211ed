pub mod attributes;
pub mod command;
pub mod palettes;

use crate::config::SgbConfig;
use crate::error::CoreError;
use crate::joypad::Joypad;
use crate::memory::registers::LcdControl;
use crate::memory::vram::Vram;
use crate::video::tile::{map_entry, TileMap, TileSet, TILE_BYTES};
use attributes::{AttributeMap, ATTRIBUTE_FILES, ATTRIBUTE_FILE_BYTES, MAP_WIDTH};
use command::{Command, ScreenMask, Transfer};
use log::{debug, trace, warn};

pub use palettes::SgbPalettes;

pub const MAX_PACKETS: usize = 7;
pub const BYTES_PER_PACKET: usize = 16;
/// 4 frames, the wait games leave between two packets.
pub const PACKET_DELAY_CYCLES: u32 = 280896;
pub const TRANSFER_SIZE: usize = 0x1000;
pub const BORDER_TILES: usize = 256;
/// 4bpp 8x8 tiles.
pub const BORDER_TILE_BYTES: usize = 32;
pub const BORDER_MAP_SIZE: usize = 32 * 32;

const P1_LINES: u8 = 0b0011_0000;
const P1_RESET: u8 = 0b0000_0000;
const P1_ZERO: u8 = 0b0010_0000;
const P1_ONE: u8 = 0b0001_0000;
const P1_RELEASE: u8 = 0b0011_0000;
const P15: u8 = 0b0010_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PacketState {
    Idle,
    Receiving { packet: usize, byte: usize, bit: u8 },
    /// A packet finished and more belong to the same command.
    BetweenPackets { packet: usize },
}

/// Super Game Boy command receiver and the state its commands build up.
#[derive(Clone)]
pub struct Sgb {
    state: PacketState,
    num_packets: usize,
    data: [[u8; BYTES_PER_PACKET]; MAX_PACKETS],
    released: bool,
    last_lines: u8,
    delay: u32,
    enforce_packet_delay: bool,

    players: u8,
    current_joypad: u8,
    read_joypad: bool,

    mask: ScreenMask,
    attraction_mode: bool,
    test_speed_mode: bool,

    palettes: SgbPalettes,
    attribute_map: AttributeMap,
    attribute_files: Vec<AttributeMap>,
    current_attribute_file: usize,

    border_tiles: Vec<u8>,
    border_map: Vec<u16>,
    pending_transfer: Option<Transfer>,
}

impl Sgb {
    pub fn new(config: SgbConfig) -> Sgb {
        Sgb {
            state: PacketState::Idle,
            num_packets: 0,
            data: [[0; BYTES_PER_PACKET]; MAX_PACKETS],
            released: false,
            last_lines: P1_RELEASE,
            delay: 0,
            enforce_packet_delay: config.enforce_packet_delay,
            players: 1,
            current_joypad: 0,
            read_joypad: false,
            mask: ScreenMask::None,
            attraction_mode: true,
            test_speed_mode: false,
            palettes: SgbPalettes::new(),
            attribute_map: AttributeMap::new(),
            attribute_files: vec![AttributeMap::new(); ATTRIBUTE_FILES],
            current_attribute_file: 0,
            border_tiles: vec![0; BORDER_TILES * BORDER_TILE_BYTES],
            border_map: vec![0; BORDER_MAP_SIZE],
            pending_transfer: None,
        }
    }

    /// Back to power-on state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Sgb::new(SgbConfig {
            enabled: true,
            enforce_packet_delay: self.enforce_packet_delay,
        });
        debug!("SGB: Reset");
    }

    pub fn tick(&mut self, cycles: u32) {
        self.delay = self.delay.saturating_sub(cycles);
    }

    /// Feed a CPU write to P1. Only bits 4 and 5 matter.
    pub fn write_p1(&mut self, value: u8) {
        let lines = value & P1_LINES;
        let previous = self.last_lines;
        let was_sending = self.sending();
        self.last_lines = lines;

        match lines {
            P1_RESET => self.reset_pulse(),
            P1_RELEASE => self.released = true,
            P1_ZERO => self.pulse(0),
            P1_ONE => self.pulse(1),
            _ => {}
        }

        if !was_sending && !self.sending() && lines != P1_RELEASE {
            self.read_joypad = true;
        }

        if self.is_multiplayer() && self.read_joypad && previous & P15 == 0 && lines & P15 != 0 {
            self.current_joypad = (self.current_joypad + 1) % self.players;
            self.read_joypad = false;
            trace!("SGB: Polling joypad {}", self.current_joypad + 1);
        }
    }

    /// P1 as seen by the CPU. With multiplayer on and both lines released the
    /// low nibble identifies the joypad being polled.
    pub fn read_p1(&self, joypads: &[Joypad]) -> u8 {
        let select = self.last_lines;
        if self.is_multiplayer() && select == P1_RELEASE {
            return 0b1100_0000 | select | (0x0f - self.current_joypad);
        }

        match joypads.get(self.current_joypad as usize) {
            Some(joypad) => joypad.as_u8(select),
            None => 0b1100_0000 | select | 0x0f,
        }
    }

    fn reset_pulse(&mut self) {
        self.released = false;
        match self.state {
            PacketState::Receiving { byte: 0, bit: 0, .. } => {}
            PacketState::Receiving { packet, byte, .. } => {
                warn!("SGB: Reset during packet {} byte {}, dropping command", packet, byte);
                self.start_packet(0);
            }
            PacketState::BetweenPackets { packet } => self.start_packet(packet),
            PacketState::Idle => self.start_packet(0),
        }
    }

    fn start_packet(&mut self, packet: usize) {
        if self.enforce_packet_delay && self.delay > 0 {
            trace!("SGB: Packet started {} cycles early, ignoring", self.delay);
            return;
        }

        if packet == 0 {
            self.num_packets = 1;
            self.data = [[0; BYTES_PER_PACKET]; MAX_PACKETS];
            self.read_joypad = false;
        }
        self.state = PacketState::Receiving { packet, byte: 0, bit: 0 };
    }

    fn pulse(&mut self, value: u8) {
        if !self.released {
            return;
        }
        self.released = false;

        // Outside of a packet this is a joypad poll or the stop bit.
        let PacketState::Receiving { packet, byte, bit } = self.state else {
            return;
        };

        self.data[packet][byte] |= value << bit;

        if bit + 1 < 8 {
            self.state = PacketState::Receiving { packet, byte, bit: bit + 1 };
        } else if byte + 1 < BYTES_PER_PACKET {
            self.state = PacketState::Receiving { packet, byte: byte + 1, bit: 0 };
        } else {
            self.finish_packet(packet);
        }
    }

    fn finish_packet(&mut self, packet: usize) {
        self.delay = PACKET_DELAY_CYCLES;

        if packet == 0 {
            self.num_packets = match (self.data[0][0] & 0b111) as usize {
                0 => 1,
                n => n,
            };
        }

        let next = packet + 1;
        if next < self.num_packets {
            self.state = PacketState::BetweenPackets { packet: next };
        } else {
            self.state = PacketState::Idle;
            self.execute();
        }
    }

    fn execute(&mut self) {
        let mut data = [0u8; MAX_PACKETS * BYTES_PER_PACKET];
        for (chunk, packet) in data.chunks_exact_mut(BYTES_PER_PACKET).zip(self.data.iter()) {
            chunk.copy_from_slice(packet);
        }
        let data = &data[..self.num_packets * BYTES_PER_PACKET];

        let command = Command::from(data[0]);
        debug!("SGB: {:?} ({} packets)", command, self.num_packets);

        match command {
            Command::Pal01 => self.set_palette_pair(data, 0, 1),
            Command::Pal23 => self.set_palette_pair(data, 2, 3),
            Command::Pal03 => self.set_palette_pair(data, 0, 3),
            Command::Pal12 => self.set_palette_pair(data, 1, 2),
            Command::AttrBlk => self.attribute_map.apply_blocks(data),
            Command::AttrLin => self.attribute_map.apply_lines(data),
            Command::AttrDiv => self.attribute_map.apply_divide(data),
            Command::AttrChr => self.attribute_map.apply_characters(data),
            Command::PalSet => self.set_system_palettes(data),
            Command::PalTrn => self.request_transfer(Transfer::Palettes),
            Command::AtrcEn => self.attraction_mode = data[1] & 0b1 == 0,
            Command::TestEn => self.test_speed_mode = data[1] & 0b1 != 0,
            Command::MltReq => self.request_multiplayer(data[1]),
            Command::ChrTrn => self.request_transfer(Transfer::Tiles {
                upper: data[1] & 0b1 != 0,
            }),
            Command::PctTrn => self.request_transfer(Transfer::Border),
            Command::AttrTrn => self.request_transfer(Transfer::Attributes),
            Command::AttrSet => {
                self.apply_attribute_file(data[1] & 0x3f);
                if data[1] & 0x40 != 0 {
                    self.mask = ScreenMask::None;
                }
            }
            Command::MaskEn => {
                self.mask = ScreenMask::from(data[1]);
                debug!("SGB: Screen mask {:?}", self.mask);
            }
            Command::Sound
            | Command::SouTrn
            | Command::IconEn
            | Command::DataSnd
            | Command::DataTrn
            | Command::Jump
            | Command::ObjTrn => debug!("SGB: Ignoring {:?}", command),
            Command::Unknown(code) => warn!("SGB: Unknown command {:02x}", code),
        }
    }

    fn set_palette_pair(&mut self, data: &[u8], first: usize, second: usize) {
        let color = |i: usize| u16::from_le_bytes([data[1 + i * 2], data[2 + i * 2]]);

        self.palettes.set_shared_color(color(0));
        self.palettes.set_screen_colors(first, [color(1), color(2), color(3)]);
        self.palettes.set_screen_colors(second, [color(4), color(5), color(6)]);
    }

    fn set_system_palettes(&mut self, data: &[u8]) {
        let index = |i: usize| (u16::from_le_bytes([data[1 + i * 2], data[2 + i * 2]]) & 0x1ff) as usize;
        self.palettes.load_system([index(0), index(1), index(2), index(3)]);

        let flags = data[9];
        if flags & 0x80 != 0 {
            self.apply_attribute_file(flags & 0x3f);
        }
        if flags & 0x40 != 0 {
            self.mask = ScreenMask::None;
        }
    }

    fn apply_attribute_file(&mut self, index: u8) {
        match self.attribute_files.get(index as usize) {
            Some(file) => {
                self.attribute_map = file.clone();
                self.current_attribute_file = index as usize;
            }
            None => warn!("SGB: Attribute file {} out of range", index),
        }
    }

    fn request_multiplayer(&mut self, mode: u8) {
        self.players = match mode & 0b11 {
            1 => 2,
            3 => 4,
            _ => 1,
        };
        self.current_joypad = 0;
        self.read_joypad = false;
        debug!("SGB: {} player mode", self.players);
    }

    fn request_transfer(&mut self, transfer: Transfer) {
        if let Some(previous) = self.pending_transfer.replace(transfer) {
            warn!("SGB: {} replaced pending {}", transfer, previous);
        }
    }

    /// The VRAM transfer waiting for the next VBlank, if any.
    pub fn pending_transfer(&self) -> Option<Transfer> {
        self.pending_transfer
    }

    /// Finish the pending transfer with 4 KiB taken from the screen.
    pub fn complete_transfer(&mut self, data: &[u8; TRANSFER_SIZE]) {
        let Some(transfer) = self.pending_transfer.take() else {
            return;
        };
        debug!("SGB: Completing {}", transfer);

        match transfer {
            Transfer::Palettes => self.palettes.load_system_table(data),
            Transfer::Tiles { upper } => {
                let start = if upper { TRANSFER_SIZE } else { 0 };
                self.border_tiles[start..start + TRANSFER_SIZE].copy_from_slice(data);
            }
            Transfer::Border => {
                for (entry, bytes) in self.border_map.iter_mut().zip(data[..0x800].chunks_exact(2)) {
                    *entry = u16::from_le_bytes([bytes[0], bytes[1]]);
                }
                self.palettes.load_border(&data[0x800..0x880]);
            }
            Transfer::Attributes => {
                let files = data.chunks_exact(ATTRIBUTE_FILE_BYTES).take(ATTRIBUTE_FILES);
                for (file, packed) in self.attribute_files.iter_mut().zip(files) {
                    *file = AttributeMap::from_packed(packed);
                }
            }
        }
    }

    pub fn sending(&self) -> bool {
        self.state != PacketState::Idle
    }

    pub fn current_bit(&self) -> u8 {
        match self.state {
            PacketState::Receiving { bit, .. } => bit,
            _ => 0,
        }
    }

    pub fn current_byte(&self) -> usize {
        match self.state {
            PacketState::Receiving { byte, .. } => byte,
            _ => 0,
        }
    }

    pub fn current_packet(&self) -> usize {
        match self.state {
            PacketState::Receiving { packet, .. } | PacketState::BetweenPackets { packet } => packet,
            PacketState::Idle => 0,
        }
    }

    pub fn packet_count(&self) -> usize {
        self.num_packets
    }

    pub fn packet(&self, index: usize) -> Option<&[u8; BYTES_PER_PACKET]> {
        self.data.get(index)
    }

    pub fn is_multiplayer(&self) -> bool {
        self.players > 1
    }

    /// Number of players when multiplayer polling is on.
    pub fn multiplayer(&self) -> Option<u8> {
        self.is_multiplayer().then_some(self.players)
    }

    pub fn current_joypad(&self) -> u8 {
        self.current_joypad
    }

    pub fn mask(&self) -> ScreenMask {
        self.mask
    }

    pub fn attraction_mode(&self) -> bool {
        self.attraction_mode
    }

    pub fn test_speed_mode(&self) -> bool {
        self.test_speed_mode
    }

    pub fn palettes(&self) -> &SgbPalettes {
        &self.palettes
    }

    pub fn attribute_map(&self) -> &AttributeMap {
        &self.attribute_map
    }

    pub fn attribute_file(&self, index: usize) -> Option<&AttributeMap> {
        self.attribute_files.get(index)
    }

    pub fn current_attribute_file(&self) -> usize {
        self.current_attribute_file
    }

    /// Screen palette for the 8x8 cell containing screen pixel (`x`, `y`).
    #[inline]
    pub fn palette_at(&self, x: usize, y: usize) -> u8 {
        self.attribute_map.get(x / 8, y / 8)
    }

    pub fn border_tiles(&self) -> &[u8] {
        &self.border_tiles
    }

    pub fn border_map(&self) -> &[u16] {
        &self.border_map
    }
}

/// Collect the 4 KiB a VRAM transfer carries: the first 256 tiles of the
/// displayed background map, read in rows of 20.
pub fn gather_transfer(vram: &Vram, lcdc: LcdControl) -> Result<[u8; TRANSFER_SIZE], CoreError> {
    let map = TileMap::background(lcdc);
    let tileset = TileSet::from_lcdc(lcdc);
    let tiles = vram.bank(0)?;
    let mut data = [0u8; TRANSFER_SIZE];

    for (i, chunk) in data.chunks_exact_mut(TILE_BYTES as usize).enumerate() {
        let column = (i % MAP_WIDTH) as u8;
        let row = (i / MAP_WIDTH) as u8;
        let entry = map_entry(vram, map, tileset, column, row, false)?;
        let start = (entry.tile * TILE_BYTES) as usize;
        chunk.copy_from_slice(&tiles[start..start + TILE_BYTES as usize]);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareMode;

    fn send_packet(sgb: &mut Sgb, packet: &[u8; BYTES_PER_PACKET]) {
        sgb.write_p1(0x00);
        sgb.write_p1(0x30);
        for byte in packet {
            for bit in 0..8 {
                sgb.write_p1(if byte >> bit & 1 != 0 { 0x10 } else { 0x20 });
                sgb.write_p1(0x30);
            }
        }
        // Stop bit.
        sgb.write_p1(0x20);
        sgb.write_p1(0x30);
    }

    fn packet(bytes: &[u8]) -> [u8; BYTES_PER_PACKET] {
        let mut packet = [0; BYTES_PER_PACKET];
        packet[..bytes.len()].copy_from_slice(bytes);
        packet
    }

    #[test]
    fn bits_shift_in_lsb_first() {
        let mut sgb = Sgb::new(SgbConfig::default());
        sgb.write_p1(0x00);
        sgb.write_p1(0x30);
        sgb.write_p1(0x10);
        sgb.write_p1(0x30);
        sgb.write_p1(0x20);
        sgb.write_p1(0x30);
        sgb.write_p1(0x10);
        sgb.write_p1(0x30);

        assert!(sgb.sending());
        assert_eq!(sgb.current_bit(), 3);
        assert_eq!(sgb.packet(0).map(|p| p[0]), Some(0b101));
    }

    #[test]
    fn pulse_without_release_is_not_sampled() {
        let mut sgb = Sgb::new(SgbConfig::default());
        sgb.write_p1(0x00);
        sgb.write_p1(0x30);
        sgb.write_p1(0x10);
        sgb.write_p1(0x10);
        sgb.write_p1(0x20);
        assert_eq!(sgb.current_bit(), 1);
    }

    #[test]
    fn packet_boundaries() {
        let mut sgb = Sgb::new(SgbConfig::default());
        // ATTR_BLK spread over two packets.
        send_packet(&mut sgb, &packet(&[0x04 << 3 | 2, 2, 0b001, 0b01, 0, 0, 1, 1, 0b001, 0b10, 10, 10, 11, 11]));

        assert!(sgb.sending());
        assert_eq!(sgb.current_packet(), 1);
        assert_eq!(sgb.current_byte(), 0);
        assert_eq!(sgb.packet_count(), 2);

        send_packet(&mut sgb, &packet(&[]));
        assert!(!sgb.sending());
        assert_eq!(sgb.attribute_map().get(0, 0), 1);
        assert_eq!(sgb.attribute_map().get(11, 11), 2);
        assert_eq!(sgb.attribute_map().get(5, 5), 0);
    }

    #[test]
    fn zero_packet_count_means_one() {
        let mut sgb = Sgb::new(SgbConfig::default());
        send_packet(&mut sgb, &packet(&[0x17 << 3, 2]));
        assert!(!sgb.sending());
        assert_eq!(sgb.packet_count(), 1);
        assert_eq!(sgb.mask(), ScreenMask::Black);
    }

    #[test]
    fn reset_mid_packet_restarts() {
        let mut sgb = Sgb::new(SgbConfig::default());
        sgb.write_p1(0x00);
        sgb.write_p1(0x30);
        for _ in 0..20 {
            sgb.write_p1(0x10);
            sgb.write_p1(0x30);
        }
        assert_eq!(sgb.current_byte(), 2);

        send_packet(&mut sgb, &packet(&[0x17 << 3 | 1, 3]));
        assert!(!sgb.sending());
        assert_eq!(sgb.mask(), ScreenMask::Backdrop);
    }

    #[test]
    fn pal01_sets_shared_color() {
        let mut sgb = Sgb::new(SgbConfig::default());
        send_packet(
            &mut sgb,
            &packet(&[0x01, 0x1f, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05, 0x00, 0x06, 0x00]),
        );

        for region in 0..4 {
            assert_eq!(sgb.palettes().color(region, 0), 0x001f);
        }
        assert_eq!(sgb.palettes().color(0, 3), 3);
        assert_eq!(sgb.palettes().color(1, 1), 4);
        assert_eq!(sgb.palettes().color(2, 1), 0x56b5);
    }

    #[test]
    fn multiplayer_cycles_joypads() {
        let mut sgb = Sgb::new(SgbConfig::default());
        let joypads = [Joypad::new(), Joypad::new(), Joypad::new(), Joypad::new()];
        send_packet(&mut sgb, &packet(&[0x11 << 3 | 1, 1]));
        assert_eq!(sgb.multiplayer(), Some(2));
        assert_eq!(sgb.read_p1(&joypads) & 0x0f, 0x0f);

        for expected in [0x0e, 0x0f, 0x0e] {
            sgb.write_p1(0x20);
            sgb.write_p1(0x10);
            sgb.write_p1(0x30);
            assert_eq!(sgb.read_p1(&joypads) & 0x0f, expected);
        }

        send_packet(&mut sgb, &packet(&[0x11 << 3 | 1, 0]));
        assert_eq!(sgb.multiplayer(), None);
    }

    #[test]
    fn palette_transfer_then_set() {
        let mut sgb = Sgb::new(SgbConfig::default());
        send_packet(&mut sgb, &packet(&[0x0b << 3 | 1]));
        assert_eq!(sgb.pending_transfer(), Some(Transfer::Palettes));

        let mut data = [0u8; TRANSFER_SIZE];
        // System palette 2, colors 0x0100..0x0103.
        for i in 0..4 {
            data[2 * 8 + i * 2] = i as u8;
            data[2 * 8 + i * 2 + 1] = 0x01;
        }
        sgb.complete_transfer(&data);
        assert_eq!(sgb.pending_transfer(), None);

        send_packet(&mut sgb, &packet(&[0x0a << 3 | 1, 2, 0, 2, 0, 2, 0, 2, 0, 0x40]));
        assert_eq!(sgb.palettes().color(3, 2), 0x0102);
        assert_eq!(sgb.palettes().color(1, 0), 0x0100);
    }

    #[test]
    fn attribute_files_round_trip_through_set() {
        let mut sgb = Sgb::new(SgbConfig::default());
        send_packet(&mut sgb, &packet(&[0x15 << 3 | 1]));

        let mut data = [0u8; TRANSFER_SIZE];
        data[ATTRIBUTE_FILE_BYTES * 3] = 0b11_00_00_00;
        sgb.complete_transfer(&data);

        send_packet(&mut sgb, &packet(&[0x17 << 3 | 1, 1]));
        assert_eq!(sgb.mask(), ScreenMask::Freeze);
        send_packet(&mut sgb, &packet(&[0x16 << 3 | 1, 0x40 | 3]));
        assert_eq!(sgb.current_attribute_file(), 3);
        assert_eq!(sgb.palette_at(0, 0), 3);
        assert_eq!(sgb.palette_at(8, 0), 0);
        assert_eq!(sgb.mask(), ScreenMask::None);
    }

    #[test]
    fn packet_delay_only_when_enforced() {
        let config = SgbConfig {
            enabled: true,
            enforce_packet_delay: true,
        };
        let mut sgb = Sgb::new(config);
        send_packet(&mut sgb, &packet(&[0x17 << 3 | 1, 2]));
        send_packet(&mut sgb, &packet(&[0x17 << 3 | 1, 0]));
        assert_eq!(sgb.mask(), ScreenMask::Black);

        sgb.tick(PACKET_DELAY_CYCLES);
        send_packet(&mut sgb, &packet(&[0x17 << 3 | 1, 0]));
        assert_eq!(sgb.mask(), ScreenMask::None);
    }

    #[test]
    fn flags_and_reset() {
        let mut sgb = Sgb::new(SgbConfig::default());
        send_packet(&mut sgb, &packet(&[0x0c << 3 | 1, 1]));
        send_packet(&mut sgb, &packet(&[0x0d << 3 | 1, 1]));
        assert!(!sgb.attraction_mode());
        assert!(sgb.test_speed_mode());

        sgb.reset();
        assert!(sgb.attraction_mode());
        assert!(!sgb.test_speed_mode());
    }

    #[test]
    fn transfer_reads_displayed_tiles() {
        let mut vram = Vram::new(HardwareMode::Dmg);
        // Map cell 21 (row 1, column 1) points at tile 7.
        vram.write(0, 0x1800 + 32 + 1, 7).unwrap();
        vram.write(0, 7 * 16 + 5, 0xab).unwrap();

        let data = gather_transfer(&vram, LcdControl::BG_TILE_DATA).unwrap();
        assert_eq!(data[21 * 16 + 5], 0xab);
        assert_eq!(data[5], 0);
    }
}
