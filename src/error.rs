//! Unified error types for the raumklima daemon.
//!
//! Every fallible subsystem funnels into one crate-level [`Error`] so callers
//! embedding the library get uniform handling. Inside the supervisor nothing
//! propagates past the loop boundary: link faults feed the reconnection path
//! and sink failures are logged and swallowed.

use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A serial connection failed to open or died mid-operation.
    #[error("link: {0}")]
    Link(#[from] LinkError),
    /// The configuration file could not be read or parsed.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// A persistence sink rejected a sample.
    #[error("sample sink: {0}")]
    Sink(#[from] SinkError),
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// Errors raised by one serial connection.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The device could not be opened (missing, busy, permissions).
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// Read or write on an open connection failed. The link is dead; the
    /// owner must close and discard it.
    #[error("I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Errors from a persistence sink. The supervisor treats these as
/// fire-and-forget: logged, never allowed to stall the control loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O: {0}")]
    Io(#[from] io::Error),

    /// The backing store rejected the sample for its own reasons.
    #[error("{0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
