//! Line protocol spoken over the serial links.
//!
//! Both nodes talk newline-terminated UTF-8. The sensor node reports
//! `{"temp":<float>,"hum":<float>}`; the fan node accepts
//! `{"fan_speed":<0-255>}`. Everything else on either wire (boot banners,
//! reset garbage, debug spew) is insignificant and dropped by the caller.

use serde_json::Value;

/// One decoded sensor report.
///
/// Keys are extracted independently: a frame with an absent or non-numeric
/// key still counts as a report, it just leaves that reading unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub temp: Option<f64>,
    pub hum: Option<f64>,
}

/// Parse one line from the sensor node.
///
/// Returns `None` unless the line is a syntactically valid JSON object;
/// unrecognized keys inside a valid object are ignored.
pub fn parse_sensor_line(line: &str) -> Option<SensorFrame> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    let obj = value.as_object()?;
    Some(SensorFrame {
        temp: obj.get("temp").and_then(Value::as_f64),
        hum: obj.get("hum").and_then(Value::as_f64),
    })
}

/// Command understood by the fan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanCommand {
    pub fan_speed: u8,
}

impl FanCommand {
    pub fn new(fan_speed: u8) -> Self {
        Self { fan_speed }
    }

    /// Render the command body; the link layer appends the line terminator.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "fan_speed": self.fan_speed }).to_string()
    }
}
