//! Application core.
//!
//! The supervisor and the port traits it is written against.  All
//! interaction with devices, clocks, and persistence happens through the
//! traits in [`ports`], keeping this layer fully testable without a single
//! real serial port.

pub mod ports;
pub mod service;

pub use ports::{Clock, PortProvider, SampleSink};
pub use service::{Phase, Supervisor, SupervisorHandle, Trigger};
