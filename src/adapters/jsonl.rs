//! Append-only JSON Lines sample log.
//!
//! One [`ClimateSample`] per line, so the file tails cleanly and imports
//! into anything that reads JSONL.  Opening an existing file appends; the
//! log survives daemon restarts.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::info;

use crate::app::ports::SampleSink;
use crate::error::SinkError;
use crate::state::ClimateSample;

pub struct JsonlSampleLog {
    file: File,
}

impl JsonlSampleLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("sample log at {}", path.display());
        Ok(Self { file })
    }
}

impl SampleSink for JsonlSampleLog {
    fn append(&mut self, sample: &ClimateSample) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_string(sample).map_err(|e| SinkError::Backend(e.to_string()))?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        Ok(())
    }
}
