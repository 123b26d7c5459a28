//! Run timing utilities.
//!
//! A run is anchored to a monotonic epoch taken when the pipeline starts,
//! paired with the wall-clock time for the run banner.

use std::time::Instant;

/// Monotonic clock anchored at the start of a run.
#[derive(Debug, Clone)]
pub struct RunClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl RunClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Items per second given `count` items processed since the epoch.
    pub fn rate(&self, count: u64) -> f64 {
        let secs = self.elapsed_secs();
        if secs <= 0.0 {
            return 0.0;
        }
        count as f64 / secs
    }
}

/// Fires once every `every` ticks. Used to throttle progress logging.
#[derive(Debug)]
pub struct ProgressGate {
    every: u64,
    ticks: u64,
}

impl ProgressGate {
    /// `every == 0` disables the gate entirely.
    pub fn new(every: u64) -> Self {
        Self { every, ticks: 0 }
    }

    /// Record one tick; returns true when this tick should be reported.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        self.every > 0 && self.ticks % self.every == 0
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
