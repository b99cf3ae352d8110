use std::collections::VecDeque;
use std::io;

/// Character I/O supplied by the host.
///
/// These four operations are the only contact the machine has with its environment.
pub trait Console {
    /// Read one byte. May block until input arrives.
    fn read_char(&mut self) -> io::Result<u8>;
    /// Whether [`Console::read_char`] would return without blocking. Never blocks.
    fn peek_ready(&mut self) -> io::Result<bool>;
    fn write_char(&mut self, byte: u8) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// In-memory console with pre-supplied input and captured output.
///
/// Reading past the end of the input yields ASCII NUL.
#[derive(Debug, Default, Clone)]
pub struct BufferedConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
    flushes: usize,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        BufferedConsole {
            input: input.as_ref().iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, input: impl AsRef<[u8]>) {
        self.input.extend(input.as_ref());
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Amount of times [`Console::flush`] was called.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Console for BufferedConsole {
    fn read_char(&mut self) -> io::Result<u8> {
        Ok(self.input.pop_front().unwrap_or(0))
    }

    fn peek_ready(&mut self) -> io::Result<bool> {
        Ok(!self.input.is_empty())
    }

    fn write_char(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
