//! The supervisor and its two-phase machine.
//!
//! [`Supervisor`] owns the two links, the control engine, and the phase
//! machine that ties discovery and operation together.  All I/O flows
//! through the port traits in [`ports`](super::ports), so the whole loop
//! runs against scripted fakes in tests.
//!
//! ```text
//!              ┌──────────────────────────────┐
//!  PortProvider│          Supervisor          │──▶ actuator Link
//!  Clock      ─│  probe · engine · phases     │──▶ SampleSink
//!              └──────────────┬───────────────┘
//!                             ▼
//!                        SharedState ◀── presentation layer
//! ```
//!
//! The loop never gives up and never lets an error escape: every failure
//! is absorbed as a phase transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::ControlEngine;
use crate::link::Link;
use crate::link::probe::{self, Discovered};
use crate::protocol::{self, FanCommand};
use crate::state::{ClimateSample, SharedState};

use super::ports::{Clock, PortProvider, SampleSink};

// ───────────────────────────────────────────────────────────────
// Phase machine
// ───────────────────────────────────────────────────────────────

/// Coarse supervisor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Probing for the two nodes; no control runs.
    Discovering,
    /// Both links bound; the control loop is live.
    Operating,
}

/// Named events that move the supervisor between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A discovery pass bound both roles.
    ProbeSuccess,
    /// I/O on either link failed.
    LinkFault,
}

/// Pure transition function of the two-phase machine.
///
/// Total over all (phase, trigger) pairs; a trigger that does not apply to
/// the current phase leaves it unchanged.
pub fn next_phase(phase: Phase, trigger: Trigger) -> Phase {
    match (phase, trigger) {
        (Phase::Discovering, Trigger::ProbeSuccess) => Phase::Operating,
        (Phase::Operating, Trigger::LinkFault) => Phase::Discovering,
        (unchanged, _) => unchanged,
    }
}

// ───────────────────────────────────────────────────────────────
// Shutdown handle
// ───────────────────────────────────────────────────────────────

/// Cooperative shutdown flag for a running [`Supervisor`].
///
/// Cloneable and cheap; flipping it stops the loop within one cycle's
/// worth of sleep, since every suspension in the loop is bounded.
#[derive(Clone)]
pub struct SupervisorHandle {
    running: Arc<AtomicBool>,
}

impl SupervisorHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Ask the supervisor to exit after the current cycle.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// Discovers the two nodes, runs the control loop over them, and starts
/// over whenever a link dies.
pub struct Supervisor {
    config: SystemConfig,
    state: SharedState,
    ports: Box<dyn PortProvider>,
    clock: Box<dyn Clock>,
    sink: Box<dyn SampleSink>,
    engine: ControlEngine,
    handle: SupervisorHandle,

    phase: Phase,
    sensor: Option<Link>,
    actuator: Option<Link>,
    /// When the engine last computed; `None` makes the next dt zero.
    last_compute: Option<Instant>,
    /// When a sample was last persisted; `None` until the cadence starts.
    last_snapshot: Option<Instant>,
    /// At least one valid reading has ever been parsed.
    seen_reading: bool,
}

impl Supervisor {
    pub fn new(
        config: SystemConfig,
        state: SharedState,
        ports: Box<dyn PortProvider>,
        clock: Box<dyn Clock>,
        sink: Box<dyn SampleSink>,
    ) -> Self {
        let engine = ControlEngine::new(&config);
        Self {
            config,
            state,
            ports,
            clock,
            sink,
            engine,
            handle: SupervisorHandle::new(),
            phase: Phase::Discovering,
            sensor: None,
            actuator: None,
            last_compute: None,
            last_snapshot: None,
            seen_reading: false,
        }
    }

    /// Handle for stopping the loop from another thread.
    pub fn handle(&self) -> SupervisorHandle {
        self.handle.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run until the handle is shut down.
    ///
    /// Never returns an error: every failure inside the loop is handled by
    /// a phase transition.
    pub fn run(&mut self) {
        info!("supervisor starting in {:?}", self.phase);
        while self.handle.is_running() {
            self.cycle();
        }
        self.drop_links();
        info!("supervisor stopped");
    }

    /// One cycle of whichever phase is active.
    ///
    /// [`run`](Self::run) is a loop over this; embedders that own their own
    /// main loop can drive cycles directly instead.
    pub fn cycle(&mut self) {
        match self.phase {
            Phase::Discovering => self.discovery_cycle(),
            Phase::Operating => self.operating_cycle(),
        }
    }

    // ── Discovering ───────────────────────────────────────────

    /// One probe pass over the still-missing roles.
    ///
    /// Each role is bound as soon as its node is classified, and the bound
    /// port becomes visible to external readers immediately, so a reader
    /// can tell "sensor found, fan still missing" from "nothing found".
    /// Only once both links are open does the supervisor move to Operating;
    /// otherwise it backs off and retries with the partial binding kept.
    fn discovery_cycle(&mut self) {
        let bound = Discovered {
            sensor: self.sensor.as_ref().map(|l| l.path().to_owned()),
            actuator: self.actuator.as_ref().map(|l| l.path().to_owned()),
        };
        let found =
            probe::discover_missing(self.ports.as_ref(), self.clock.as_ref(), &self.config, bound);

        if self.sensor.is_none() {
            if let Some(path) = found.sensor.as_deref() {
                self.sensor = self.open_role("sensor", path);
            }
        }
        if self.actuator.is_none() {
            if let Some(path) = found.actuator.as_deref() {
                self.actuator = self.open_role("fan", path);
            }
        }
        self.publish_bound_ports();

        if self.sensor.is_some() && self.actuator.is_some() {
            self.last_compute = None;
            self.transition(Trigger::ProbeSuccess);
            return;
        }
        self.clock
            .sleep(Duration::from_millis(self.config.discovery_backoff_ms));
    }

    /// Open a link for a freshly classified role.
    ///
    /// An open failure (the node vanished between probe and open, or the
    /// port went busy) is logged; the role stays missing and is re-probed
    /// on the next pass.
    fn open_role(&self, role: &str, path: &str) -> Option<Link> {
        let timeout = Duration::from_millis(self.config.read_timeout_ms);
        match self.ports.open(path, self.config.baud_rate, timeout) {
            Ok(link) => {
                info!("{role} node bound on {path}");
                Some(link)
            }
            Err(e) => {
                warn!("{role} node classified on {path} but open failed: {e}");
                None
            }
        }
    }

    fn publish_bound_ports(&self) {
        self.state.set_bound_ports(
            self.sensor.as_ref().map(|l| l.path().to_owned()),
            self.actuator.as_ref().map(|l| l.path().to_owned()),
        );
    }

    // ── Operating ─────────────────────────────────────────────

    /// One control cycle: poll the sensor, act on a complete line, and keep
    /// the sample cadence going.
    fn operating_cycle(&mut self) {
        // a bare link slot in this phase means the session is already gone
        if self.sensor.is_none() || self.actuator.is_none() {
            self.fault();
            return;
        }
        let Some(sensor) = self.sensor.as_mut() else {
            return;
        };
        let polled = sensor.poll_line();

        match polled {
            Ok(Some(line)) => self.handle_line(&line),
            Ok(None) => self
                .clock
                .sleep(Duration::from_millis(self.config.idle_sleep_ms)),
            Err(e) => {
                warn!("sensor link failed: {e}");
                self.fault();
                return;
            }
        }

        if self.phase == Phase::Operating {
            self.maybe_snapshot();
        }
    }

    /// Act on one complete sensor line.
    ///
    /// Only a frame carrying both readings drives the engine; an incomplete
    /// report still replaces the published readings, and anything that is
    /// not a JSON object is dropped without a trace.
    fn handle_line(&mut self, line: &str) {
        let Some(frame) = protocol::parse_sensor_line(line) else {
            debug!("dropping malformed frame {line:?}");
            return;
        };

        if frame.temp.is_some() || frame.hum.is_some() {
            self.seen_reading = true;
        }

        let (Some(temp), Some(hum)) = (frame.temp, frame.hum) else {
            self.state.update_readings(frame.temp, frame.hum);
            debug!("frame without both readings, no command");
            return;
        };

        // readings go out first; a reader may see new readings with the
        // previous output, never a new output with stale readings
        self.state.update_readings(Some(temp), Some(hum));

        let snapshot = self.state.snapshot();
        let dt = self.elapsed_since_last_compute();
        let decision = self.engine.step(
            temp,
            hum,
            snapshot.target_temperature,
            snapshot.target_humidity,
            snapshot.control_mode,
            dt,
        );

        debug!(
            "{} arbitration commands fan_speed={}",
            snapshot.control_mode.as_str(),
            decision.fan_speed
        );

        let command = FanCommand::new(decision.fan_speed).to_json();
        let Some(actuator) = self.actuator.as_mut() else {
            return;
        };
        match actuator.write_line(&command) {
            Ok(()) => {
                self.state
                    .publish_sample(Some(temp), Some(hum), decision.fan_speed);
            }
            Err(e) => {
                warn!("fan link failed: {e}");
                self.fault();
            }
        }
    }

    fn elapsed_since_last_compute(&mut self) -> f64 {
        let now = self.clock.now();
        let dt = match self.last_compute {
            Some(prev) => now.duration_since(prev).as_secs_f64(),
            None => 0.0,
        };
        self.last_compute = Some(now);
        dt
    }

    /// Persist a sample once per interval, independent of sample arrival,
    /// after the first valid reading has ever been seen.  A failing sink is
    /// logged and ignored.
    fn maybe_snapshot(&mut self) {
        if !self.seen_reading {
            return;
        }
        let now = self.clock.now();
        let Some(prev) = self.last_snapshot else {
            // first eligible cycle starts the cadence
            self.last_snapshot = Some(now);
            return;
        };
        if now.duration_since(prev) < Duration::from_secs(self.config.snapshot_interval_secs) {
            return;
        }
        self.last_snapshot = Some(now);

        let sample = ClimateSample::capture(Utc::now(), &self.state.snapshot());
        if let Err(e) = self.sink.append(&sample) {
            warn!("sample sink failed: {e}");
        }
    }

    // ── Fault handling ────────────────────────────────────────

    /// End the device session: both links drop, bound ports clear, loop
    /// state resets, and a cooldown keeps us off a node mid-reset.
    fn fault(&mut self) {
        self.drop_links();
        self.engine.reset();
        self.last_compute = None;
        self.transition(Trigger::LinkFault);
        self.clock
            .sleep(Duration::from_millis(self.config.fault_cooldown_ms));
    }

    fn drop_links(&mut self) {
        self.sensor = None;
        self.actuator = None;
        self.publish_bound_ports();
    }

    fn transition(&mut self, trigger: Trigger) {
        let next = next_phase(self.phase, trigger);
        if next != self.phase {
            info!("supervisor: {:?} -> {next:?} on {trigger:?}", self.phase);
            self.phase = next;
        }
    }
}
