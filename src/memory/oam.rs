use crate::error::CoreError;
use crate::video::sprite::Sprite;

pub const OAM_ENTRIES: usize = 40;
pub const OAM_SIZE: usize = OAM_ENTRIES * 4;

/// Object attribute memory: 40 entries of Y, X, tile, attributes.
#[derive(Clone)]
pub struct Oam {
    data: [u8; OAM_SIZE],
}

impl Oam {
    pub fn new() -> Oam {
        Oam { data: [0; OAM_SIZE] }
    }

    #[inline]
    pub fn read(&self, offset: u16) -> Result<u8, CoreError> {
        self.data
            .get(offset as usize)
            .copied()
            .ok_or(CoreError::OamOffsetOutOfRange { offset })
    }

    #[inline]
    pub fn write(&mut self, offset: u16, data: u8) -> Result<(), CoreError> {
        let slot = self
            .data
            .get_mut(offset as usize)
            .ok_or(CoreError::OamOffsetOutOfRange { offset })?;
        *slot = data;
        Ok(())
    }

    pub fn entry(&self, index: usize) -> Result<Sprite, CoreError> {
        if index >= OAM_ENTRIES {
            return Err(CoreError::InvalidOamIndex { index });
        }

        let base = index * 4;
        Ok(Sprite::new(
            index,
            self.data[base],
            self.data[base + 1],
            self.data[base + 2],
            self.data[base + 3],
        ))
    }

    pub fn set_entry(&mut self, index: usize, sprite: &Sprite) -> Result<(), CoreError> {
        if index >= OAM_ENTRIES {
            return Err(CoreError::InvalidOamIndex { index });
        }

        let base = index * 4;
        self.data[base] = sprite.y;
        self.data[base + 1] = sprite.x;
        self.data[base + 2] = sprite.tile_index;
        self.data[base + 3] = sprite.attributes.bits();
        Ok(())
    }

    pub fn sprites(&self) -> impl Iterator<Item = Sprite> + '_ {
        self.data.chunks_exact(4).enumerate().map(|(index, raw)| Sprite::new(index, raw[0], raw[1], raw[2], raw[3]))
    }

    /// Replace the whole table, as an OAM DMA transfer does.
    pub fn load(&mut self, data: &[u8; OAM_SIZE]) {
        self.data.copy_from_slice(data);
    }
}

impl Default for Oam {
    fn default() -> Oam {
        Oam::new()
    }
}
