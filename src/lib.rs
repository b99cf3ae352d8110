// Machine model
mod symbol;
pub use symbol::{Flag, Opcode, Register, TrapVect};
pub mod decode;
mod registers;
pub use registers::{RegisterFile, PC_START};
pub mod memory;
pub use memory::Memory;

// Loading
mod image;
pub use image::ObjectImage;

// Running
mod runtime;
pub use runtime::{Machine, Status, DEFAULT_PROMPT};
mod console;
pub use console::{BufferedConsole, Console};
mod term;
pub use term::TerminalConsole;

mod error;
pub use error::{Fault, LoadError};

pub mod output;
pub mod env;
