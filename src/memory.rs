use crate::console::Console;
use crate::error::{Fault, LoadError};
use crate::image::ObjectImage;

/// 65,536 addressable 16-bit words.
pub const MEMORY_SIZE: usize = 0x10000;

/// Keyboard status register. Bit 15 is set while a key is ready.
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Low byte holds the last character read.
pub const KBDR: u16 = KBSR + 1;

const KEY_READY: u16 = 1 << 15;

/// Flat word-addressed memory with a memory-mapped keyboard.
///
/// Only reads of [`KBSR`] have side effects; every write is a plain store.
pub struct Memory {
    cells: Box<[u16]>,
}

impl Memory {
    /// Allocate zeroed memory.
    pub fn new() -> Self {
        Memory {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Read a word as the processor does.
    ///
    /// Reading [`KBSR`] first polls `console` without blocking: a ready key is moved into
    /// [`KBDR`] and the ready bit set, otherwise the ready bit is cleared.
    pub fn read<C: Console + ?Sized>(&mut self, addr: u16, console: &mut C) -> Result<u16, Fault> {
        if addr == KBSR {
            if console.peek_ready()? {
                let ch = console.read_char()?;
                self.cells[KBSR as usize] = KEY_READY;
                self.cells[KBDR as usize] = ch as u16;
            } else {
                self.cells[KBSR as usize] = 0;
            }
        }
        Ok(self.cells[addr as usize])
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u16) {
        self.cells[addr as usize] = val;
    }

    /// Read a word without device side effects.
    #[inline]
    pub fn peek(&self, addr: u16) -> u16 {
        self.cells[addr as usize]
    }

    /// View memory from `addr` up to the top of the address space.
    ///
    /// Used by string output, which scans forward without copying.
    pub fn get(&self, addr: u16) -> &[u16] {
        &self.cells[addr as usize..]
    }

    /// Place an object image at its origin.
    ///
    /// An image which would extend past 0xFFFF is rejected before any word is written.
    pub fn load(&mut self, image: &ObjectImage) -> Result<(), LoadError> {
        let range = image.range()?;
        self.cells[range].copy_from_slice(image.words());
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
