//! Real serial stack behind [`PortProvider`] and [`Transport`].
//!
//! Built on the `serialport` crate.  Reads are made non-blocking by asking
//! the driver how many bytes are queued before touching `read()`, which is
//! what the [`Transport`](crate::link::Transport) contract wants; the
//! builder timeout only matters as a backstop when that count races the
//! hardware.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::warn;
use serialport::SerialPort;

use crate::app::ports::PortProvider;
use crate::error::LinkError;
use crate::link::{Link, Transport};

// ───────────────────────────────────────────────────────────────
// PortProvider
// ───────────────────────────────────────────────────────────────

/// Enumerates and opens real serial devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialAdapter;

impl SerialAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl PortProvider for SerialAdapter {
    fn candidates(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                // treated the same as an empty bus; the caller retries anyway
                warn!("serial enumeration failed: {e}");
                Vec::new()
            }
        }
    }

    fn open(&self, path: &str, baud: u32, read_timeout: Duration) -> Result<Link, LinkError> {
        let port = serialport::new(path, baud)
            .timeout(read_timeout)
            .open()
            .map_err(|source| LinkError::Open {
                path: path.to_owned(),
                source,
            })?;
        Ok(Link::new(path, Box::new(SerialTransport::new(port))))
    }
}

// ───────────────────────────────────────────────────────────────
// Transport
// ───────────────────────────────────────────────────────────────

/// One open serial device as a byte [`Transport`].
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Transport for SerialTransport {
    fn read_pending(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let queued = self.port.bytes_to_read().map_err(io::Error::from)?;
        if queued == 0 {
            return Ok(0);
        }
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            // queued bytes can evaporate between the count and the read
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()
    }
}
