//! raumklima daemon entry point.
//!
//! Wires the real adapters into the supervisor and runs it on the main
//! thread until the process is killed.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SerialAdapter      SystemClock     JsonlSampleLog /     │
//! │  (PortProvider)     (Clock)         MemoryHistory        │
//! │                                     (SampleSink)         │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ────────────────   │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            Supervisor (pure logic)                 │  │
//! │  │  discovery · dual-loop PID · phase machine         │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Environment:
//! - `RAUMKLIMA_CONFIG` overrides the config path (default `raumklima.toml`)
//! - `RAUMKLIMA_SAMPLE_LOG` routes samples to a JSON Lines file instead of
//!   the in-memory ring
//! - `RUST_LOG` filters log output (default `info`)

use std::env;

use anyhow::Result;
use log::info;
use tracing_subscriber::EnvFilter;

use raumklima::adapters::{JsonlSampleLog, MemoryHistory, SerialAdapter, SystemClock};
use raumklima::app::{SampleSink, Supervisor};
use raumklima::{SharedState, SystemConfig};

const DEFAULT_CONFIG_PATH: &str = "raumklima.toml";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("raumklima v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config_path =
        env::var("RAUMKLIMA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let config = SystemConfig::load(&config_path)?;

    // ── 3. Shared state and sample sink ───────────────────────
    let state = SharedState::new(&config);
    let sink: Box<dyn SampleSink> = match env::var("RAUMKLIMA_SAMPLE_LOG") {
        Ok(path) => Box::new(JsonlSampleLog::open(path)?),
        Err(_) => Box::new(MemoryHistory::new(config.history_capacity)),
    };

    // ── 4. Supervisor ─────────────────────────────────────────
    let mut supervisor = Supervisor::new(
        config,
        state,
        Box::new(SerialAdapter::new()),
        Box::new(SystemClock::new()),
        sink,
    );
    supervisor.run();

    Ok(())
}
