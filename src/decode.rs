//! Bit-field extraction for instruction words.
//!
//! Field positions follow the canonical layout:
//!
//! ```text
//! |15  12|11  9|8   6|5|4    0|
//! |opcode| DR  | SR1 |m| imm5 |   ADD, AND
//! |opcode| DR  | SR1 |0|00|SR2|   ADD, AND
//! |opcode|n z p|  PCoffset9   |   BR
//! |opcode| DR  |  PCoffset9   |   LD, LDI, LEA, ST, STI
//! |opcode| DR  |BaseR|offset6 |   LDR, STR
//! |opcode|000  |BaseR|000000  |   JMP, JSRR
//! |opcode|1|   PCoffset11     |   JSR
//! |opcode|0000 |  trapvect8   |   TRAP
//! ```

use crate::error::Fault;
use crate::symbol::{Opcode, Register};

/// Extract `width` bits of `word` starting at bit `offset`.
#[inline]
pub fn field(word: u16, offset: u32, width: u32) -> u16 {
    debug_assert!(width > 0 && offset + width <= 16);
    let mask = if width >= 16 {
        u16::MAX
    } else {
        (1u16 << width) - 1
    };
    (word >> offset) & mask
}

/// Sign-extend the low `bits` bits of `val` to 16 bits.
///
/// Bits above the field are ignored.
#[inline]
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits <= 16);
    if bits >= 16 {
        return val;
    }
    let magnitude = field(val, 0, bits);
    if magnitude >> (bits - 1) & 1 == 1 {
        magnitude | (u16::MAX << bits)
    } else {
        magnitude
    }
}

/// A fetched instruction word with accessors for each operand field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Word(pub u16);

impl Word {
    pub fn opcode(self) -> Result<Opcode, Fault> {
        let code = field(self.0, 12, 4);
        Opcode::from_code(code).ok_or(Fault::IllegalOpcode { opcode: code })
    }

    fn reg_at(self, offset: u32) -> Result<Register, Fault> {
        let code = field(self.0, offset, 3);
        Register::general(code).ok_or(Fault::InvalidRegister { code })
    }

    /// Destination register, also the source register of stores.
    pub fn dr(self) -> Result<Register, Fault> {
        self.reg_at(9)
    }

    /// First source register, also the base register of `LDR`/`STR`/`JMP`/`JSRR`.
    pub fn sr1(self) -> Result<Register, Fault> {
        self.reg_at(6)
    }

    pub fn base_r(self) -> Result<Register, Fault> {
        self.reg_at(6)
    }

    pub fn sr2(self) -> Result<Register, Fault> {
        self.reg_at(0)
    }

    /// Bit 5 of `ADD`/`AND`.
    pub fn is_imm(self) -> bool {
        field(self.0, 5, 1) == 1
    }

    /// Bit 11 of `JSR`.
    pub fn is_pc_relative(self) -> bool {
        field(self.0, 11, 1) == 1
    }

    /// Requested `n`, `z`, `p` bits of `BR`.
    pub fn nzp(self) -> u16 {
        field(self.0, 9, 3)
    }

    pub fn imm5(self) -> u16 {
        sign_extend(self.0, 5)
    }

    pub fn offset6(self) -> u16 {
        sign_extend(self.0, 6)
    }

    pub fn pc_offset9(self) -> u16 {
        sign_extend(self.0, 9)
    }

    pub fn pc_offset11(self) -> u16 {
        sign_extend(self.0, 11)
    }

    pub fn trap_vect(self) -> u8 {
        field(self.0, 0, 8) as u8
    }
}
