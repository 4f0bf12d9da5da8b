//! raumklima: a closed-loop room climate daemon.
//!
//! Two USB serial nodes hang off the host: a sensor node streaming
//! temperature and humidity as JSON lines, and a fan node accepting JSON
//! speed commands.  This crate discovers which port is which, runs a
//! dual-loop PID against configurable targets, and publishes a coherent
//! view of the whole system for embedding frontends.
//!
//! ```text
//!   sensor node ──▶ Link ──▶ Supervisor ──▶ ControlEngine
//!                              │   ▲              │
//!                              ▼   │              ▼
//!                         SampleSink          fan node
//!                              │
//!                         SharedState ◀── embedding frontend
//! ```
//!
//! The [`app::Supervisor`] is the only long-running piece; everything it
//! touches sits behind a port trait, so the full loop is exercised in
//! tests against scripted fakes.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod link;
pub mod protocol;
pub mod state;

#[cfg(test)]
pub(crate) mod testkit;

pub use app::{Supervisor, SupervisorHandle};
pub use config::SystemConfig;
pub use error::{Error, Result};
pub use state::{ControlMode, SharedState};
