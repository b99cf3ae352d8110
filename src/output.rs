use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;

use colored::Colorize;

use crate::registers::RegisterFile;
use crate::symbol::{Opcode, Register};

/// Host-side reporting. Everything here goes to stderr, leaving stdout to the program.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Status lines, eg. `Running`, `Halted`.
    Status,
    /// Per-instruction trace.
    Trace,
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        if new_value {
            colored::control::set_override(false);
        }
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    /// Print `left` right-aligned in a 12 column gutter, followed by `right`.
    pub fn message(&self, color: MsgColor, left: &str, right: impl Display) {
        if Self::is_minimal() {
            return;
        }
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
            MsgColor::Red => left.red(),
        };
        eprintln!("{left:>12} {right}");
    }

    pub fn file_message(&self, color: MsgColor, left: &str, path: &Path) {
        self.message(color, left, format_args!("target {}", path.display()));
    }

    pub fn print_opcode(&self, addr: u16, word: u16, opcode: Opcode) {
        if Self::is_minimal() {
            return;
        }
        let line = format!("0x{addr:04x}  0x{word:04x}  {:<4}", opcode.mnemonic());
        eprintln!("{:>12} {}", "Trace".dimmed(), line.blue());
    }

    pub fn print_registers(&self, reg: &RegisterFile) {
        let flag = reg.flag().map_or("???", |flag| flag.name());

        if Self::is_minimal() {
            for r in Register::GENERAL {
                eprintln!("{} {}", r, reg.get(r));
            }
            eprintln!("PC {}", reg.pc());
            eprintln!("CC {:03b}", reg.get(Register::COND));
            return;
        }

        eprintln!("{}", "┌────────────────────────────────────┐".dimmed());
        eprintln!(
            "{}        {}{}",
            "│".dimmed(),
            "hex     int    uint    char".italic(),
            " │".dimmed()
        );
        for r in Register::GENERAL {
            let val = reg.get(r);
            eprintln!(
                "{} {}  0x{:04x}  {:-6}  {:-6}   {} {}",
                "│".dimmed(),
                r.name().bold(),
                val,
                val as i16,
                val,
                char_display(val),
                "│".dimmed()
            );
        }
        eprintln!(
            "{} {}  0x{:04x}                 {}  {:<4}{}",
            "│".dimmed(),
            "PC".bold(),
            reg.pc(),
            "CC".bold(),
            flag,
            " │".dimmed()
        );
        eprintln!("{}", "└────────────────────────────────────┘".dimmed());
    }
}

/// Three column rendering of a word as a character.
fn char_display(value: u16) -> String {
    match value {
        // ASCII control characters which are arbitrarily considered significant
        0x00 => "NUL".into(),
        0x08 => "BS ".into(),
        0x09 => "HT ".into(),
        0x0a => "LF ".into(),
        0x0d => "CR ".into(),
        0x1b => "ESC".into(),
        0x7f => "DEL".into(),
        0x20 => "[_]".into(),
        0x21..=0x7e => format!("{:<3}", value as u8 as char),
        // Other control characters and anything outside ASCII
        _ => "───".dimmed().to_string(),
    }
}
