//! Port traits: the boundary between the supervisor and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (the real serial stack, the system clock, persistence
//! sinks) implement these traits.  The [`Supervisor`](super::service::Supervisor)
//! consumes them as trait objects, so the loop runs identically over real
//! hardware and over scripted fakes.  No test ever touches a wall clock or
//! a device node.

use std::time::{Duration, Instant};

use crate::error::{LinkError, SinkError};
use crate::link::Link;
use crate::state::ClimateSample;

// ───────────────────────────────────────────────────────────────
// Port provider (driven adapter: serial stack → domain)
// ───────────────────────────────────────────────────────────────

/// Enumerates candidate serial devices and opens them as [`Link`]s.
pub trait PortProvider: Send {
    /// Device paths currently visible on the host, unfiltered.
    ///
    /// Enumeration failure is indistinguishable from "no devices": the
    /// discovery loop retries either way.
    fn candidates(&self) -> Vec<String>;

    /// Open one device at the given baud with a bounded read timeout.
    fn open(&self, path: &str, baud: u32, read_timeout: Duration) -> Result<Link, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: time → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic time and bounded suspension.
///
/// Every sleep and every elapsed-time computation in the supervisor flows
/// through this trait.
pub trait Clock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Sample sink (driven adapter: domain → persistence)
// ───────────────────────────────────────────────────────────────

/// Append-only persistence collaborator for [`ClimateSample`]s.
///
/// The supervisor treats appends as fire-and-forget: a failing sink is
/// logged and must never stall the control loop.
pub trait SampleSink: Send {
    fn append(&mut self, sample: &ClimateSample) -> Result<(), SinkError>;
}
