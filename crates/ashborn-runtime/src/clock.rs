//! Monotonic frame clock

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of monotonic timestamps.
///
/// Implementations must never go backwards; wall-clock adjustments are
/// not visible through this trait.
pub trait TimeSource: Send {
    fn now(&self) -> Instant;
}

/// The process monotonic clock ([`Instant::now`])
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualTime {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// Move time forward by a number of seconds. Negative, NaN or
    /// out-of-range values are ignored.
    pub fn advance_secs(&self, secs: f64) {
        match Duration::try_from_secs_f64(secs) {
            Ok(by) => self.advance(by),
            Err(_) => tracing::warn!(secs, "ignoring invalid time advance"),
        }
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Measures elapsed time between consecutive samples.
///
/// Holds only the previous sample.
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    previous: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// A clock over the process monotonic time.
    pub fn new() -> Self {
        Self::with_source(MonotonicTime)
    }

    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        let previous = source.now();
        Self {
            source: Box::new(source),
            previous,
        }
    }

    /// Current timestamp from the underlying source.
    pub fn now(&self) -> Instant {
        self.source.now()
    }

    /// Take a new sample and return the seconds elapsed since the previous one.
    pub fn sample(&mut self) -> f64 {
        let now = self.source.now();
        let elapsed = now.saturating_duration_since(self.previous);
        self.previous = now;
        elapsed.as_secs_f64()
    }

    /// Timestamp of the most recent sample.
    pub fn last_sample(&self) -> Instant {
        self.previous
    }

    /// Restart measurement from the current time, discarding the pending interval.
    pub fn reset(&mut self) {
        self.previous = self.source.now();
    }
}
