//! Shared controller state
//!
//! `SharedState` is the single cross-thread register of the daemon.  The
//! supervisor thread writes readings and computed commands into it; external
//! readers (the API layer this crate deliberately leaves out) take snapshots
//! and adjust targets.  Think of it as the blackboard both sides inspect.
//!
//! One mutex guards the whole record, so an observer always sees a
//! consistent mix of fields.  In particular, an actuator output is never
//! visible without the sensor sample that produced it.  The lock is never
//! held across I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Control mode
// ---------------------------------------------------------------------------

/// Which feedback loop drives the fan.
///
/// Serialized with the wire/API vocabulary the rest of the installation
/// speaks (`"TEMP"` / `"HUM"` / `"AUTO"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// The temperature loop alone commands the fan.
    #[default]
    #[serde(rename = "TEMP")]
    Temperature,
    /// The humidity loop alone commands the fan.
    #[serde(rename = "HUM")]
    Humidity,
    /// Both loops run; the stronger demand wins.
    #[serde(rename = "AUTO")]
    Auto,
}

impl ControlMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "TEMP",
            Self::Humidity => "HUM",
            Self::Auto => "AUTO",
        }
    }
}

// ---------------------------------------------------------------------------
// Controller state (the shared record)
// ---------------------------------------------------------------------------

/// Point-in-time view of the whole controller.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerState {
    /// Last parsed temperature reading (°C); `None` until a sample arrives.
    pub current_temperature: Option<f64>,
    /// Last parsed relative-humidity reading (%); `None` until a sample arrives.
    pub current_humidity: Option<f64>,
    /// Temperature setpoint (°C).
    pub target_temperature: f64,
    /// Relative-humidity setpoint (%).
    pub target_humidity: f64,
    /// Active arbitration policy.
    pub control_mode: ControlMode,
    /// Last command sent to the fan node (0–255).  Written only by the
    /// control path, together with the readings it was computed from.
    pub actuator_output: u8,
    /// Device path currently bound as the sensor node.
    pub sensor_port: Option<String>,
    /// Device path currently bound as the fan node.
    pub actuator_port: Option<String>,
}

impl ControllerState {
    /// Both roles bound, which is the externally visible "connected" signal.
    pub fn connected(&self) -> bool {
        self.sensor_port.is_some() && self.actuator_port.is_some()
    }
}

// ---------------------------------------------------------------------------
// Climate sample (persistence record)
// ---------------------------------------------------------------------------

/// One persisted climate record, produced on a fixed interval.
///
/// Readings are nullable: a sample taken while the sensor is quiet still
/// documents the commanded fan speed at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub fan_speed: u8,
    pub mode: ControlMode,
}

impl ClimateSample {
    /// Capture the loggable fields of a state snapshot.
    pub fn capture(timestamp: DateTime<Utc>, state: &ControllerState) -> Self {
        Self {
            timestamp,
            temperature: state.current_temperature,
            humidity: state.current_humidity,
            fan_speed: state.actuator_output,
            mode: state.control_mode,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Cheaply clonable handle to the mutex-guarded [`ControllerState`].
///
/// Every method is one exclusive critical section; there is no operation
/// that exposes a partially updated record.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<ControllerState>>,
}

impl SharedState {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControllerState {
                current_temperature: None,
                current_humidity: None,
                target_temperature: config.default_target_temp,
                target_humidity: config.default_target_hum,
                control_mode: ControlMode::default(),
                actuator_output: 0,
                sensor_port: None,
                actuator_port: None,
            })),
        }
    }

    /// A panicked reader must not wedge the control thread, so lock
    /// poisoning is stripped rather than propagated.
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomic snapshot of the whole record.
    pub fn snapshot(&self) -> ControllerState {
        self.lock().clone()
    }

    /// Replace both readings from one sensor frame.
    ///
    /// A frame fully determines both values: a key that was absent or
    /// non-numeric arrives here as `None` and unsets that reading.
    pub fn update_readings(&self, temp: Option<f64>, hum: Option<f64>) {
        let mut state = self.lock();
        state.current_temperature = temp;
        state.current_humidity = hum;
    }

    /// Commit one computed cycle: the readings and the actuator output they
    /// produced become visible together.  This is the only writer of
    /// `actuator_output`.
    pub(crate) fn publish_sample(&self, temp: Option<f64>, hum: Option<f64>, output: u8) {
        let mut state = self.lock();
        state.current_temperature = temp;
        state.current_humidity = hum;
        state.actuator_output = output;
    }

    /// Partial target update, the 1:1 seam for the settings endpoint of the
    /// presentation layer.  `None` leaves a field untouched.
    pub fn set_targets(&self, temp: Option<f64>, hum: Option<f64>, mode: Option<ControlMode>) {
        let mut state = self.lock();
        if let Some(t) = temp {
            state.target_temperature = t;
        }
        if let Some(h) = hum {
            state.target_humidity = h;
        }
        if let Some(m) = mode {
            state.control_mode = m;
        }
    }

    /// Currently bound device paths as `(sensor, actuator)`.
    pub fn bound_ports(&self) -> (Option<String>, Option<String>) {
        let state = self.lock();
        (state.sensor_port.clone(), state.actuator_port.clone())
    }

    pub(crate) fn set_bound_ports(&self, sensor: Option<String>, actuator: Option<String>) {
        let mut state = self.lock();
        state.sensor_port = sensor;
        state.actuator_port = actuator;
    }

    /// Both roles bound.
    pub fn connected(&self) -> bool {
        self.lock().connected()
    }
}
