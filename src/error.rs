use std::{io, path::PathBuf, sync::Arc};

use miette::Diagnostic;
use thiserror::Error;

use crate::symbol::Opcode;

// Loader errors

/// Failure to turn a persisted object image into memory contents.
///
/// Surfaced before execution begins; the machine keeps its freshly constructed state.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("Could not open object file `{}`", path.display())]
    #[diagnostic(
        code(load::open),
        help("check that the file exists and is readable")
    )]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read object image")]
    #[diagnostic(code(load::read))]
    Read(#[from] io::Error),

    #[error("Object image is not aligned to 16 bits ({len} bytes)")]
    #[diagnostic(
        code(load::misaligned),
        help("object images are a sequence of big-endian 16-bit words")
    )]
    Misaligned { len: usize },

    #[error("Object image has no origin word")]
    #[diagnostic(
        code(load::empty),
        help("the first word of an object image is its load address")
    )]
    Empty,

    #[error("Program of {len} words does not fit in memory when loaded at 0x{origin:04x}")]
    #[diagnostic(
        code(load::overflow),
        help("the last word must be placed at or below 0xffff")
    )]
    Overflow { origin: u16, len: usize },
}

// Runtime errors

/// Reason execution stopped abnormally.
///
/// Raised before the faulting instruction mutates registers or memory.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum Fault {
    #[error("Encountered an illegal opcode 0x{opcode:x}")]
    #[diagnostic(code(fault::opcode))]
    IllegalOpcode { opcode: u16 },

    #[error("Encountered the unsupported opcode {opcode}")]
    #[diagnostic(
        code(fault::reserved),
        help("RTI and the reserved opcode are not implemented by this machine")
    )]
    ReservedOpcode { opcode: Opcode },

    #[error("Instruction names a register outside R0-R7 (code {code})")]
    #[diagnostic(code(fault::register))]
    InvalidRegister { code: u16 },

    #[error("Called a trap with an unknown vector of 0x{vector:02x}")]
    #[diagnostic(
        code(fault::trap),
        help("supported vectors are 0x20 (GETC) through 0x25 (HALT)")
    )]
    InvalidTrap { vector: u8 },

    #[error("Console I/O failed")]
    #[diagnostic(code(fault::console))]
    Console(#[source] Arc<io::Error>),
}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Self {
        Fault::Console(Arc::new(err))
    }
}
