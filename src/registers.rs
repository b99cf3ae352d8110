use crate::symbol::{Flag, Register};

/// Architectural load address, where execution starts.
pub const PC_START: u16 = 0x3000;

/// The eight general registers, program counter and condition code.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegisterFile {
    reg: [u16; Register::COUNT],
}

impl RegisterFile {
    /// General registers start zeroed, `PC` at [`PC_START`] and `COND` holding the zero flag.
    pub fn new() -> Self {
        let mut reg = [0; Register::COUNT];
        reg[Register::PC as usize] = PC_START;
        reg[Register::COND as usize] = Flag::Zro.bits();
        RegisterFile { reg }
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u16 {
        self.reg[reg as usize]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, val: u16) {
        self.reg[reg as usize] = val;
    }

    pub fn pc(&self) -> u16 {
        self.get(Register::PC)
    }

    /// Store exactly one flag in `COND` according to the sign of `reg`.
    #[inline]
    pub fn update_flags(&mut self, reg: Register) {
        let flag = Flag::of(self.get(reg));
        self.set(Register::COND, flag.bits());
    }

    /// Current condition flag.
    ///
    /// `COND` can be overwritten through [`RegisterFile::set`]; a value which is not one of the
    /// three flags reads as `None`.
    pub fn flag(&self) -> Option<Flag> {
        Flag::from_bits(self.get(Register::COND))
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
