//! Serial link layer
//!
//! A [`Link`] is one open byte-stream connection to a physical node, framed
//! into newline-terminated lines:
//!
//! ```text
//!   serial device ──▶ Transport ──▶ Link (line framing) ──▶ supervisor
//! ```
//!
//! The raw byte stream sits behind the [`Transport`] trait, so tests drive a
//! [`Link`] with scripted bytes instead of hardware.  A `Link` is owned
//! exclusively by the supervisor and is replaced, never repaired: any I/O
//! error is returned to the caller, who drops the link and re-discovers.

pub mod probe;

use std::io;

use log::debug;

use crate::error::LinkError;

/// Ceiling on buffered unterminated bytes.  A node that streams garbage
/// without ever sending a newline must not grow the buffer forever; past
/// this size the pending bytes are discarded wholesale.
const MAX_PENDING_BYTES: usize = 4096;

// ---------------------------------------------------------------------------
// Transport (byte-stream seam)
// ---------------------------------------------------------------------------

/// Raw byte stream under a [`Link`].
pub trait Transport: Send {
    /// Move bytes that have already arrived into `buf`, returning how many
    /// were written.  `Ok(0)` means nothing is pending right now; the call
    /// must not wait for more.
    fn read_pending(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// One open, line-framed connection to a physical node.
pub struct Link {
    path: String,
    transport: Box<dyn Transport>,
    pending: Vec<u8>,
}

impl Link {
    pub fn new(path: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            path: path.into(),
            transport,
            pending: Vec::new(),
        }
    }

    /// Device path this link is bound to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Drain whatever the device has sent so far and return at most one
    /// complete line, decoded lossily and stripped of the terminator (and a
    /// trailing `\r`).  `None` when no full line is pending.
    pub fn poll_line(&mut self) -> Result<Option<String>, LinkError> {
        let mut chunk = [0u8; 256];
        loop {
            let n = self
                .transport
                .read_pending(&mut chunk)
                .map_err(|e| self.io_error(e))?;
            if n == 0 {
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }

        if self.pending.len() > MAX_PENDING_BYTES && !self.pending.contains(&b'\n') {
            debug!(
                "{}: discarding {} unterminated bytes",
                self.path,
                self.pending.len()
            );
            self.pending.clear();
        }

        Ok(self.take_line())
    }

    /// Write one line, appending the terminator.
    pub fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line.as_bytes());
        framed.push(b'\n');
        self.transport
            .write_all(&framed)
            .map_err(|e| self.io_error(e))
    }

    fn take_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw[..pos]);
        Some(line.trim_end_matches('\r').to_owned())
    }

    fn io_error(&self, source: io::Error) -> LinkError {
        LinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
