//! Serial device autodiscovery
//!
//! Nothing at the USB level tells the sensor node and the fan node apart:
//! same board, same adapter chip, and the host may enumerate them in any
//! order on any boot.  The prober therefore opens each plausible candidate,
//! waits out the open-triggered reset, and listens briefly to what the node
//! says about itself:
//!
//! - a line mentioning both `temp` and `hum` marks the sensor node;
//! - a line mentioning `Motor` or `Ready` marks the fan node.
//!
//! A role is assigned at most once per pass (first match wins) and is never
//! re-probed while the resulting link stays open.

use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{Clock, PortProvider};
use crate::config::SystemConfig;
use crate::error::LinkError;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Role a probed device is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Sensor,
    Actuator,
    Unknown,
}

/// Classify one line of node output.
///
/// The sensor check runs first, so a line that somehow carries both
/// vocabularies counts as a sensor line.
pub fn classify_line(line: &str) -> DeviceRole {
    if line.contains("temp") && line.contains("hum") {
        DeviceRole::Sensor
    } else if line.contains("Motor") || line.contains("Ready") {
        DeviceRole::Actuator
    } else {
        DeviceRole::Unknown
    }
}

// ---------------------------------------------------------------------------
// Discovery pass
// ---------------------------------------------------------------------------

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub sensor: Option<String>,
    pub actuator: Option<String>,
}

impl Discovered {
    /// Both roles found a device.
    pub fn complete(&self) -> bool {
        self.sensor.is_some() && self.actuator.is_some()
    }
}

/// Run one discovery pass over the currently visible devices.
///
/// Candidates are paths whose name contains one of the configured hints.
/// Each is opened, settled, and polled for up to the probe window; open or
/// probe failures are logged and the candidate is skipped.  Every opened
/// candidate is closed before this returns, and the scan stops early once
/// both roles are filled.
pub fn discover(ports: &dyn PortProvider, clock: &dyn Clock, config: &SystemConfig) -> Discovered {
    discover_missing(ports, clock, config, Discovered::default())
}

/// Resume a discovery pass with some roles already bound.
///
/// A path in `bound` carries an open link and is never re-probed; only the
/// still-missing roles can be filled.  Otherwise behaves like
/// [`discover`].
pub fn discover_missing(
    ports: &dyn PortProvider,
    clock: &dyn Clock,
    config: &SystemConfig,
    bound: Discovered,
) -> Discovered {
    let mut found = bound;
    if found.complete() {
        return found;
    }

    let candidates: Vec<String> = ports
        .candidates()
        .into_iter()
        .filter(|path| config.port_name_hints.iter().any(|hint| path.contains(hint.as_str())))
        .filter(|path| {
            found.sensor.as_deref() != Some(path.as_str())
                && found.actuator.as_deref() != Some(path.as_str())
        })
        .collect();

    if candidates.is_empty() {
        debug!("no candidate serial devices visible");
        return found;
    }
    info!("probing {} candidate device(s)", candidates.len());

    for path in candidates {
        if found.complete() {
            break;
        }
        match probe_one(ports, clock, config, &path) {
            Ok(role) => assign(&mut found, role, path),
            Err(e) => warn!("cannot probe {path}: {e}"),
        }
    }

    found
}

/// Open one candidate and listen for a classifiable line.
///
/// The link is dropped (closed) on every path out of this function.
fn probe_one(
    ports: &dyn PortProvider,
    clock: &dyn Clock,
    config: &SystemConfig,
    path: &str,
) -> Result<DeviceRole, LinkError> {
    let mut link = ports.open(
        path,
        config.baud_rate,
        Duration::from_millis(config.read_timeout_ms),
    )?;

    // opening the port toggles DTR and reboots the node; let it come up
    clock.sleep(Duration::from_millis(config.probe_settle_ms));

    let deadline = clock.now() + Duration::from_millis(config.probe_window_ms);
    while clock.now() < deadline {
        match link.poll_line()? {
            Some(line) => {
                let role = classify_line(&line);
                if role != DeviceRole::Unknown {
                    return Ok(role);
                }
                debug!("{path}: unclassifiable line {line:?}");
            }
            None => clock.sleep(Duration::from_millis(config.probe_poll_ms)),
        }
    }

    Ok(DeviceRole::Unknown)
}

fn assign(found: &mut Discovered, role: DeviceRole, path: String) {
    match role {
        DeviceRole::Sensor if found.sensor.is_none() => {
            info!("{path}: classified as sensor node");
            found.sensor = Some(path);
        }
        DeviceRole::Actuator if found.actuator.is_none() => {
            info!("{path}: classified as fan node");
            found.actuator = Some(path);
        }
        DeviceRole::Unknown => {
            debug!("{path}: no classifiable output within the probe window");
        }
        // the role already has a device; first match wins
        _ => debug!("{path}: duplicate {role:?}, ignoring"),
    }
}
