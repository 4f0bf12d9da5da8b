//! System configuration parameters
//!
//! All tunable parameters for the raumklima daemon.
//! Values can be overridden via a TOML file (`raumklima.toml` by default,
//! or the path in `RAUMKLIMA_CONFIG`); a missing file means defaults.

use std::fs;
use std::io;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gain triple for one PID loop.
///
/// Both stock loops run *negative* gains: the fan is a cooling/drying
/// actuator, so a measurement above its setpoint must push the output up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Serial ---
    /// Baud rate shared by both attached nodes
    pub baud_rate: u32,
    /// Read timeout on an open link (milliseconds)
    pub read_timeout_ms: u64,
    /// Name substrings that qualify a device path as a probe candidate
    pub port_name_hints: Vec<String>,

    // --- Probing ---
    /// Settle delay after opening a candidate, so the node can finish its
    /// open-triggered reset before we listen (milliseconds)
    pub probe_settle_ms: u64,
    /// How long to wait for a classifiable line per candidate (milliseconds)
    pub probe_window_ms: u64,
    /// Poll interval while waiting inside the window (milliseconds)
    pub probe_poll_ms: u64,

    // --- Supervisor timing ---
    /// Pause between discovery passes while a role is still missing (milliseconds)
    pub discovery_backoff_ms: u64,
    /// Cooldown after a link fault before re-probing (milliseconds)
    pub fault_cooldown_ms: u64,
    /// Idle sleep when no sensor line is pending (milliseconds)
    pub idle_sleep_ms: u64,
    /// Interval between persisted climate samples (seconds)
    pub snapshot_interval_secs: u64,

    // --- Control ---
    /// Temperature loop gains
    pub temp_gains: PidGains,
    /// Humidity loop gains
    pub hum_gains: PidGains,
    /// Lower bound of the actuator command range
    pub output_min: f64,
    /// Upper bound of the actuator command range
    pub output_max: f64,
    /// Target temperature (Celsius) until the presentation layer overrides it
    pub default_target_temp: f64,
    /// Target relative humidity (%) until the presentation layer overrides it
    pub default_target_hum: f64,

    // --- History ---
    /// Capacity of the bounded in-memory sample history
    pub history_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Serial
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            port_name_hints: ["ACM", "USB", "COM", "usbmodem", "usbserial"]
                .into_iter()
                .map(String::from)
                .collect(),

            // Probing
            probe_settle_ms: 2000, // node reboots on open
            probe_window_ms: 3000,
            probe_poll_ms: 50,

            // Supervisor timing
            discovery_backoff_ms: 5000,
            fault_cooldown_ms: 2000,
            idle_sleep_ms: 100, // 10 Hz poll ceiling
            snapshot_interval_secs: 30,

            // Control
            temp_gains: PidGains {
                kp: -10.0,
                ki: -0.1,
                kd: -0.05,
            },
            hum_gains: PidGains {
                kp: -5.0,
                ki: -0.05,
                kd: -0.01,
            },
            output_min: 0.0,
            output_max: 255.0,
            default_target_temp: 22.0,
            default_target_hum: 50.0,

            // History
            history_capacity: 1000,
        }
    }
}

impl SystemConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// a startup error rather than something to silently paper over.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
