//! Bounded in-memory sample history.
//!
//! The default [`SampleSink`]: a ring of the newest samples, shared between
//! the supervisor (writer) and whatever presentation layer wants a recent
//! trend (readers).  Handles are cheap clones of one ring.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::ports::SampleSink;
use crate::error::SinkError;
use crate::state::ClimateSample;

/// Cloneable handle onto one bounded sample ring.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    inner: Arc<Mutex<Ring>>,
}

#[derive(Debug)]
struct Ring {
    samples: VecDeque<ClimateSample>,
    capacity: usize,
}

impl MemoryHistory {
    /// A ring keeping the newest `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Ring {
                samples: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The newest `limit` samples, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ClimateSample> {
        let ring = self.lock();
        let skip = ring.samples.len().saturating_sub(limit);
        ring.samples.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().samples.is_empty()
    }
}

impl SampleSink for MemoryHistory {
    fn append(&mut self, sample: &ClimateSample) -> Result<(), SinkError> {
        let mut ring = self.lock();
        if ring.samples.len() >= ring.capacity {
            ring.samples.pop_front();
        }
        ring.samples.push_back(sample.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ControlMode;
    use chrono::Utc;

    fn sample(fan_speed: u8) -> ClimateSample {
        ClimateSample {
            timestamp: Utc::now(),
            temperature: Some(21.5),
            humidity: Some(48.0),
            fan_speed,
            mode: ControlMode::Temperature,
        }
    }

    #[test]
    fn keeps_only_the_newest_when_full() {
        let mut history = MemoryHistory::new(3);
        for speed in 0..5 {
            history.append(&sample(speed)).unwrap();
        }
        let speeds: Vec<u8> = history.recent(10).iter().map(|s| s.fan_speed).collect();
        assert_eq!(speeds, vec![2, 3, 4]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn recent_returns_the_tail_oldest_first() {
        let mut history = MemoryHistory::new(10);
        for speed in [1, 2, 3] {
            history.append(&sample(speed)).unwrap();
        }
        let speeds: Vec<u8> = history.recent(2).iter().map(|s| s.fan_speed).collect();
        assert_eq!(speeds, vec![2, 3]);
    }

    #[test]
    fn clones_share_one_ring() {
        let history = MemoryHistory::new(4);
        let mut writer = history.clone();
        assert!(history.is_empty());
        writer.append(&sample(9)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(1)[0].fan_speed, 9);
    }
}
