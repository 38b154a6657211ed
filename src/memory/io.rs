use crate::error::CoreError;
use crate::memory::IO_START;

pub const IO_PORTS_SIZE: usize = 0x100;

/// Raw register file for $FF00-$FFFF, including HRAM and IE.
///
/// Reads and writes here have no side effects; the MMU layers register
/// semantics on top.
#[derive(Clone)]
pub struct IoPorts {
    ports: [u8; IO_PORTS_SIZE],
}

impl IoPorts {
    pub fn new() -> IoPorts {
        IoPorts { ports: [0; IO_PORTS_SIZE] }
    }

    #[inline]
    pub fn read(&self, register: u16) -> Result<u8, CoreError> {
        Ok(self.ports[IoPorts::index(register)?])
    }

    #[inline]
    pub fn write(&mut self, register: u16, data: u8) -> Result<(), CoreError> {
        self.ports[IoPorts::index(register)?] = data;
        Ok(())
    }

    #[inline]
    fn index(register: u16) -> Result<usize, CoreError> {
        match register.checked_sub(IO_START) {
            Some(index) => Ok(index as usize),
            None => Err(CoreError::InvalidIoRegister { register }),
        }
    }
}

impl Default for IoPorts {
    fn default() -> IoPorts {
        IoPorts::new()
    }
}
