//! Scripted fakes for exercising the supervisor without hardware.
//!
//! Transports replay bytes a device "sent" and capture what the host wrote;
//! the clock advances only when someone sleeps on it, so whole
//! discovery/fault/retry sequences run in microseconds; sinks record or
//! refuse what they are handed.  Handles are cheap clones over shared
//! interior state, letting a test keep inspecting a fake after ownership of
//! the boxed trait object has moved into the code under test.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::app::ports::{Clock, PortProvider, SampleSink};
use crate::error::{LinkError, SinkError};
use crate::link::{Link, Transport};
use crate::state::ClimateSample;

// ---------------------------------------------------------------------------
// FakeTransport
// ---------------------------------------------------------------------------

/// Byte stream backed by two in-memory buffers.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<TransportState>>,
}

#[derive(Default)]
struct TransportState {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes as if the device had sent them.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.inner.lock().unwrap().incoming.extend(bytes.iter().copied());
    }

    /// Queue one newline-terminated line from the device.
    pub fn push_line(&self, line: &str) {
        self.push_bytes(line.as_bytes());
        self.push_bytes(b"\n");
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    /// The host's writes split into lines (terminators stripped).
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8(self.written())
            .unwrap()
            .split_terminator('\n')
            .map(str::to_owned)
            .collect()
    }

    /// All subsequent reads fail, as if the cable were pulled.
    pub fn fail_reads(&self) {
        self.inner.lock().unwrap().fail_reads = true;
    }

    /// All subsequent writes fail.
    pub fn fail_writes(&self) {
        self.inner.lock().unwrap().fail_writes = true;
    }
}

impl Transport for FakeTransport {
    fn read_pending(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted read failure"));
        }
        let n = buf.len().min(state.incoming.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.incoming.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        state.written.extend_from_slice(buf);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeClock
// ---------------------------------------------------------------------------

/// Clock that only moves when somebody sleeps on it.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<ClockState>>,
}

struct ClockState {
    now: Instant,
    slept: Duration,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                now: Instant::now(),
                slept: Duration::ZERO,
            })),
        }
    }

    /// Total time the code under test has asked to sleep.
    pub fn total_slept(&self) -> Duration {
        self.inner.lock().unwrap().slept
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.inner.lock().unwrap();
        state.now += duration;
        state.slept += duration;
    }
}

// ---------------------------------------------------------------------------
// ScriptedPorts
// ---------------------------------------------------------------------------

/// Port provider over a fixed cast of scripted devices.
#[derive(Clone, Default)]
pub struct ScriptedPorts {
    inner: Arc<Mutex<PortsState>>,
}

#[derive(Default)]
struct PortsState {
    devices: Vec<ScriptedDevice>,
    opens: Vec<String>,
}

struct ScriptedDevice {
    path: String,
    // None: opening this device always fails
    transport: Option<FakeTransport>,
}

impl ScriptedPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, or replace the transport of an existing path (a
    /// replugged node comes back with a fresh byte stream).
    pub fn add_device(&self, path: &str, transport: FakeTransport) {
        self.upsert(path, Some(transport));
    }

    /// Add a device whose open always fails (busy or permission-denied port).
    pub fn add_failing_device(&self, path: &str) {
        self.upsert(path, None);
    }

    /// Handle to a device's transport, to script traffic mid-test.
    pub fn transport(&self, path: &str) -> FakeTransport {
        self.inner
            .lock()
            .unwrap()
            .devices
            .iter()
            .find(|d| d.path == path)
            .and_then(|d| d.transport.clone())
            .unwrap()
    }

    /// How many times the given path has been opened.
    pub fn open_count(&self, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .opens
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    fn upsert(&self, path: &str, transport: Option<FakeTransport>) {
        let mut state = self.inner.lock().unwrap();
        if let Some(existing) = state.devices.iter_mut().find(|d| d.path == path) {
            existing.transport = transport;
        } else {
            state.devices.push(ScriptedDevice {
                path: path.to_owned(),
                transport,
            });
        }
    }
}

impl PortProvider for ScriptedPorts {
    fn candidates(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .devices
            .iter()
            .map(|d| d.path.clone())
            .collect()
    }

    fn open(&self, path: &str, _baud: u32, _read_timeout: Duration) -> Result<Link, LinkError> {
        let mut state = self.inner.lock().unwrap();
        state.opens.push(path.to_owned());
        let transport = state
            .devices
            .iter()
            .find(|d| d.path == path)
            .and_then(|d| d.transport.clone());
        match transport {
            Some(t) => Ok(Link::new(path, Box::new(t))),
            None => Err(LinkError::Open {
                path: path.to_owned(),
                source: serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "scripted open failure",
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Sink that remembers every sample it was handed.
#[derive(Clone, Default)]
pub struct CollectingSink {
    inner: Arc<Mutex<Vec<ClimateSample>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<ClimateSample> {
        self.inner.lock().unwrap().clone()
    }
}

impl SampleSink for CollectingSink {
    fn append(&mut self, sample: &ClimateSample) -> Result<(), SinkError> {
        self.inner.lock().unwrap().push(sample.clone());
        Ok(())
    }
}

/// Sink that refuses every sample, counting the attempts.
#[derive(Clone, Default)]
pub struct FailingSink {
    attempts: Arc<Mutex<usize>>,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl SampleSink for FailingSink {
    fn append(&mut self, _sample: &ClimateSample) -> Result<(), SinkError> {
        *self.attempts.lock().unwrap() += 1;
        Err(SinkError::Backend("scripted sink failure".to_owned()))
    }
}
