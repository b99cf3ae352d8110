use std::fmt;

/// Represents the machine registers.
///
/// `R0`..`R7` are addressable from instruction operand fields, `PC` and `COND` are not.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    /// Receives the return address of `JSR`/`JSRR`.
    R7,
    /// Program counter
    PC,
    /// Condition code
    COND,
}

impl Register {
    pub const COUNT: usize = 10;

    pub const GENERAL: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    const NAMES: [&'static str; Self::COUNT] =
        ["R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "PC", "COND"];

    /// Map a raw operand code onto a general purpose register.
    ///
    /// Codes above 7 are rejected rather than wrapped.
    pub fn general(code: u16) -> Option<Register> {
        Self::GENERAL.get(code as usize).copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign of the last value written by a flag-setting instruction.
///
/// Discriminants match the `n`, `z`, `p` bits of a `BR` instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    /// +
    Pos = 0b001,
    /// 0
    Zro = 0b010,
    /// -
    Neg = 0b100,
}

impl Flag {
    /// Classify a 16-bit value by its two's-complement sign.
    pub fn of(value: u16) -> Flag {
        if value == 0 {
            Flag::Zro
        } else if value & 0x8000 != 0 {
            Flag::Neg
        } else {
            Flag::Pos
        }
    }

    pub fn from_bits(bits: u16) -> Option<Flag> {
        match bits {
            0b001 => Some(Flag::Pos),
            0b010 => Some(Flag::Zro),
            0b100 => Some(Flag::Neg),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::Pos => "POS",
            Flag::Zro => "ZRO",
            Flag::Neg => "NEG",
        }
    }
}

/// The sixteen operation codes, indexed by the top four bits of an instruction.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    BR = 0x0,
    ADD,
    LD,
    ST,
    JSR,
    AND,
    LDR,
    STR,
    /// Return from interrupt. Not supported by this machine.
    RTI,
    NOT,
    LDI,
    STI,
    JMP,
    /// Reserved.
    RES,
    LEA,
    TRAP,
}

impl Opcode {
    pub const COUNT: usize = 16;

    const ALL: [Opcode; Self::COUNT] = [
        Opcode::BR,
        Opcode::ADD,
        Opcode::LD,
        Opcode::ST,
        Opcode::JSR,
        Opcode::AND,
        Opcode::LDR,
        Opcode::STR,
        Opcode::RTI,
        Opcode::NOT,
        Opcode::LDI,
        Opcode::STI,
        Opcode::JMP,
        Opcode::RES,
        Opcode::LEA,
        Opcode::TRAP,
    ];

    const MNEMONICS: [&'static str; Self::COUNT] = [
        "BR", "ADD", "LD", "ST", "JSR", "AND", "LDR", "STR", "RTI", "NOT", "LDI", "STI", "JMP",
        "RES", "LEA", "TRAP",
    ];

    pub fn from_code(code: u16) -> Option<Opcode> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        Self::MNEMONICS[self as usize]
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Built-in console service routines reachable through `TRAP`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrapVect {
    /// Read a character without echo
    Getc = 0x20,
    /// Write a character
    Out = 0x21,
    /// Write a string of one character per word
    Puts = 0x22,
    /// Prompt, read and echo a character
    In = 0x23,
    /// Write a string of two characters per word
    Putsp = 0x24,
    Halt = 0x25,
}

impl TrapVect {
    const FIRST: u8 = 0x20;

    const ALL: [TrapVect; 6] = [
        TrapVect::Getc,
        TrapVect::Out,
        TrapVect::Puts,
        TrapVect::In,
        TrapVect::Putsp,
        TrapVect::Halt,
    ];

    const NAMES: [&'static str; 6] = ["GETC", "OUT", "PUTS", "IN", "PUTSP", "HALT"];

    pub fn from_code(code: u8) -> Option<TrapVect> {
        let idx = code.checked_sub(Self::FIRST)?;
        Self::ALL.get(idx as usize).copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[(self as u8 - Self::FIRST) as usize]
    }
}

impl fmt::Display for TrapVect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
