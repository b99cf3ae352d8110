use std::io::{self, stdin, stdout, IsTerminal, Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

use crate::console::Console;

/// Console backed by the process' stdin and stdout.
///
/// An interactive terminal is read one key at a time in raw mode. Raw mode is only held for the
/// duration of a single read or poll, so program output is never written in raw mode.
///
/// When stdin is not a terminal it is drained by a background thread. A key is "ready" once
/// a byte has arrived, polling never waits on the pipe, and reading past the end yields
/// ASCII NUL.
pub struct TerminalConsole {
    kind: Input,
    /// Key read by a poll, to be returned by the next read.
    pending: Option<u8>,
    /// Trailing UTF-8 bytes of a multi-byte character.
    buffered: Vec<u8>,
}

enum Input {
    Terminal,
    /// Bytes forwarded by the reader thread. Disconnected at end of input.
    Piped(Receiver<u8>),
}

impl TerminalConsole {
    pub fn new() -> Self {
        if stdin().is_terminal() {
            Self::with_input(Input::Terminal)
        } else {
            Self::from_reader(stdin())
        }
    }

    /// Console taking its input from `reader` instead of a terminal.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::with_input(Input::Piped(spawn_reader(reader)))
    }

    fn with_input(kind: Input) -> Self {
        TerminalConsole {
            kind,
            pending: None,
            buffered: Vec::new(),
        }
    }

    /// Take the next byte of a previously read multi-byte character.
    fn take_buffered(&mut self) -> Option<u8> {
        if self.buffered.is_empty() {
            None
        } else {
            Some(self.buffered.remove(0))
        }
    }

    /// Split a character into its first UTF-8 byte, keeping the rest for later reads.
    fn encode(&mut self, ch: char) -> u8 {
        let mut bytes = [0u8; 4];
        let encoded = ch.encode_utf8(&mut bytes).as_bytes();
        self.buffered.extend_from_slice(&encoded[1..]);
        encoded[0]
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn read_char(&mut self) -> io::Result<u8> {
        if let Some(byte) = self.pending.take().or_else(|| self.take_buffered()) {
            return Ok(byte);
        }
        if let Input::Piped(input) = &self.kind {
            return Ok(input.recv().unwrap_or(0));
        }
        let ch = with_raw_mode(read_char)?;
        Ok(self.encode(ch))
    }

    fn peek_ready(&mut self) -> io::Result<bool> {
        if self.pending.is_some() || !self.buffered.is_empty() {
            return Ok(true);
        }
        if let Input::Piped(input) = &self.kind {
            let Ok(byte) = input.try_recv() else {
                return Ok(false);
            };
            self.pending = Some(byte);
            return Ok(true);
        }
        let Some(ch) = with_raw_mode(poll_char)? else {
            return Ok(false);
        };
        self.pending = Some(self.encode(ch));
        Ok(true)
    }

    fn write_char(&mut self, byte: u8) -> io::Result<()> {
        stdout().write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        stdout().flush()
    }
}

/// Forward every byte of `reader` into a channel from a background thread.
///
/// The channel disconnects once `reader` is exhausted or fails.
fn spawn_reader<R>(mut reader: R) -> Receiver<u8>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = [0u8; 256];
        loop {
            let len = match reader.read(&mut buf) {
                Ok(0) => return,
                Ok(len) => len,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    log::warn!("stopped reading input: {err}");
                    return;
                }
            };
            for &byte in &buf[..len] {
                // Receiver dropped along with the console
                if tx.send(byte).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

/// Run `func` with the terminal in raw mode, restoring it afterwards.
fn with_raw_mode<F, R>(func: F) -> io::Result<R>
where
    F: FnOnce() -> io::Result<R>,
{
    terminal::enable_raw_mode()?;
    let result = func();
    terminal::disable_raw_mode()?;
    result
}

/// Read single character from interactive terminal.
///
/// Loops until a character or `Enter` is read.
///
/// Caller must ensure terminal is in raw mode.
fn read_char() -> io::Result<char> {
    loop {
        if let Some(ch) = key_char(event::read()?) {
            return Ok(ch);
        }
    }
}

/// Drain pending events without blocking until a character is found.
///
/// Caller must ensure terminal is in raw mode.
fn poll_char() -> io::Result<Option<char>> {
    while event::poll(Duration::ZERO)? {
        if let Some(ch) = key_char(event::read()?) {
            return Ok(Some(ch));
        }
    }
    Ok(None)
}

/// Character produced by a key press, if any.
///
/// `Ctrl+C` will always return the terminal to normal state and exit.
fn key_char(event: Event) -> Option<char> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if kind == KeyEventKind::Release {
        return None;
    }
    match (modifiers, code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            let _ = terminal::disable_raw_mode();
            println!();
            std::process::exit(130);
        }
        (_, KeyCode::Enter) => Some('\n'),
        (_, KeyCode::Backspace) => Some('\x08'),
        (_, KeyCode::Tab) => Some('\t'),
        (_, KeyCode::Esc) => Some('\x1b'),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(ch)) => Some(ch),
        _ => None,
    }
}
