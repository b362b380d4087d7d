//! UART Line Protocol
//!
//! Assembles newline terminated commands from a byte stream and interprets
//! the LED control commands.

use defmt::{warn, Format};
use heapless::Vec;

/// Default command buffer length
pub const CMD_BUFFER_LEN: usize = 256;

/// Accumulates bytes until a `\n` completes a line. `\r` is dropped.
pub struct LineBuffer<const N: usize = CMD_BUFFER_LEN> {
    buf: Vec<u8, N>,
    complete: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            complete: false,
        }
    }

    /// Feed one byte. Returns the finished line (without terminator) when
    /// `byte` is `\n`.
    ///
    /// A line longer than the buffer is discarded and collection restarts
    /// from the overflowing byte.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }

        match byte {
            b'\r' => None,
            b'\n' => {
                self.complete = true;
                Some(self.buf.as_slice())
            }
            _ => {
                if self.buf.push(byte).is_err() {
                    warn!("Command longer than {} bytes, discarding", N);
                    self.buf.clear();
                    let _ = self.buf.push(byte);
                }
                None
            }
        }
    }

    /// Bytes collected for the line in progress
    pub fn pending(&self) -> &[u8] {
        if self.complete {
            &[]
        } else {
            self.buf.as_slice()
        }
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands accepted by the UART LED application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum LedCommand {
    On,
    Off,
}

impl LedCommand {
    /// Exact match on `on` / `off`; anything else is ignored
    pub fn parse(line: &[u8]) -> Option<Self> {
        match line {
            b"on" => Some(LedCommand::On),
            b"off" => Some(LedCommand::Off),
            _ => None,
        }
    }
}
