use crate::memory::registers::LcdStatus;

pub const DOTS_PER_LINE: u32 = 456;
pub const VISIBLE_LINES: u8 = 144;
pub const LINES_PER_FRAME: u8 = 154;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    HBlank,  // H-Blank
    VBlank,  // V-Blank
    OamScan, // OAM Scan
    Drawing, // Drawing
}

impl State {
    pub fn as_u8(self) -> u8 {
        match self {
            State::HBlank => 0,
            State::VBlank => 1,
            State::OamScan => 2,
            State::Drawing => 3,
        }
    }

    /// Dots spent in this state on one line. VBlank is counted line by line.
    pub fn duration(self) -> u32 {
        match self {
            State::OamScan => 80,
            State::Drawing => 172,
            State::HBlank => 204,
            State::VBlank => DOTS_PER_LINE,
        }
    }

    /// STAT enable bit that raises an interrupt when entering this state.
    pub fn stat_source(self) -> Option<LcdStatus> {
        match self {
            State::HBlank => Some(LcdStatus::HBLANK_INTERRUPT),
            State::VBlank => Some(LcdStatus::VBLANK_INTERRUPT),
            State::OamScan => Some(LcdStatus::OAM_INTERRUPT),
            State::Drawing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_line_adds_up() {
        let line: u32 = [State::OamScan, State::Drawing, State::HBlank]
            .iter()
            .map(|s| s.duration())
            .sum();
        assert_eq!(line, DOTS_PER_LINE);
    }
}
