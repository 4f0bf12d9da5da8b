//! Dual-loop control engine
//!
//! Runs one PID loop per climate quantity (temperature, humidity) and
//! arbitrates them into a single fan command according to the active mode.
//! Both loops are stepped every cycle regardless of mode so their state
//! evolves identically whichever demand ends up driving the fan.

use crate::config::SystemConfig;
use crate::control::pid::PidController;
use crate::state::ControlMode;

/// Outcome of one control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlDecision {
    /// What the temperature loop alone would command
    pub temp_demand: u8,
    /// What the humidity loop alone would command
    pub hum_demand: u8,
    /// The arbitrated command actually sent to the fan
    pub fan_speed: u8,
}

pub struct ControlEngine {
    temp_loop: PidController,
    hum_loop: PidController,
}

impl ControlEngine {
    pub fn new(config: &SystemConfig) -> Self {
        let mut temp_loop = PidController::new(config.temp_gains, config.default_target_temp);
        let mut hum_loop = PidController::new(config.hum_gains, config.default_target_hum);
        temp_loop.set_limits(config.output_min, config.output_max);
        hum_loop.set_limits(config.output_min, config.output_max);
        Self {
            temp_loop,
            hum_loop,
        }
    }

    /// Compute one control decision from the current readings.
    ///
    /// Setpoints are refreshed from the shared targets first, so a target
    /// change always takes effect on the next sample and never retroactively.
    /// Per-loop outputs are truncated to whole commands *before* arbitration.
    pub fn step(
        &mut self,
        temp: f64,
        hum: f64,
        target_temp: f64,
        target_hum: f64,
        mode: ControlMode,
        dt_secs: f64,
    ) -> ControlDecision {
        self.temp_loop.set_target(target_temp);
        self.hum_loop.set_target(target_hum);

        let temp_demand = self.temp_loop.compute(temp, dt_secs) as u8;
        let hum_demand = self.hum_loop.compute(hum, dt_secs) as u8;

        let fan_speed = match mode {
            ControlMode::Temperature => temp_demand,
            ControlMode::Humidity => hum_demand,
            // the stronger demand wins; either quantity out of range is
            // reason enough to run the fan
            ControlMode::Auto => temp_demand.max(hum_demand),
        };

        ControlDecision {
            temp_demand,
            hum_demand,
            fan_speed,
        }
    }

    /// Drop accumulated loop state (integral, previous error).
    ///
    /// Called when the device session ends; a stale integral from before an
    /// outage must not kick the fan on the first sample of the next session.
    pub fn reset(&mut self) {
        self.temp_loop.reset();
        self.hum_loop.reset();
    }
}
