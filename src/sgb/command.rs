/// SGB command codes, taken from bits 3-7 of a command's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pal01,
    Pal23,
    Pal03,
    Pal12,
    AttrBlk,
    AttrLin,
    AttrDiv,
    AttrChr,
    Sound,
    SouTrn,
    PalSet,
    PalTrn,
    AtrcEn,
    TestEn,
    IconEn,
    DataSnd,
    DataTrn,
    MltReq,
    Jump,
    ChrTrn,
    PctTrn,
    AttrTrn,
    AttrSet,
    MaskEn,
    ObjTrn,
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(header: u8) -> Self {
        match header >> 3 {
            0x00 => Command::Pal01,
            0x01 => Command::Pal23,
            0x02 => Command::Pal03,
            0x03 => Command::Pal12,
            0x04 => Command::AttrBlk,
            0x05 => Command::AttrLin,
            0x06 => Command::AttrDiv,
            0x07 => Command::AttrChr,
            0x08 => Command::Sound,
            0x09 => Command::SouTrn,
            0x0a => Command::PalSet,
            0x0b => Command::PalTrn,
            0x0c => Command::AtrcEn,
            0x0d => Command::TestEn,
            0x0e => Command::IconEn,
            0x0f => Command::DataSnd,
            0x10 => Command::DataTrn,
            0x11 => Command::MltReq,
            0x12 => Command::Jump,
            0x13 => Command::ChrTrn,
            0x14 => Command::PctTrn,
            0x15 => Command::AttrTrn,
            0x16 => Command::AttrSet,
            0x17 => Command::MaskEn,
            0x18 => Command::ObjTrn,
            code => Command::Unknown(code),
        }
    }
}

/// The 4 KiB VRAM transfers. Their payload is only available once the
/// game has put it on screen, so they finish at the next VBlank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Palettes,
    /// Border tiles 0x00-0x7f, or 0x80-0xff when `upper` is set.
    Tiles { upper: bool },
    Border,
    Attributes,
}

impl std::fmt::Display for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Transfer::Palettes => write!(f, "PAL_TRN"),
            Transfer::Tiles { .. } => write!(f, "CHR_TRN"),
            Transfer::Border => write!(f, "PCT_TRN"),
            Transfer::Attributes => write!(f, "ATTR_TRN"),
        }
    }
}

/// What MASK_EN does to the Game Boy screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenMask {
    #[default]
    None,
    /// Keep showing the last frame.
    Freeze,
    Black,
    /// Fill with shared color 0.
    Backdrop,
}

impl From<u8> for ScreenMask {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => ScreenMask::None,
            1 => ScreenMask::Freeze,
            2 => ScreenMask::Black,
            _ => ScreenMask::Backdrop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_decoding() {
        assert_eq!(Command::from(0x00 << 3 | 1), Command::Pal01);
        assert_eq!(Command::from(0x04 << 3 | 1), Command::AttrBlk);
        assert_eq!(Command::from(0x11 << 3 | 1), Command::MltReq);
        assert_eq!(Command::from(0x17 << 3 | 1), Command::MaskEn);
        assert_eq!(Command::from(0x1f << 3), Command::Unknown(0x1f));
    }
}
