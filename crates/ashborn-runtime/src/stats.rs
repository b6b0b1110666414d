//! Cached engine statistics
//!
//! Gathering counters from every subsystem is not free, so the snapshot is
//! refreshed at most once per interval and stale reads in between are expected.

use std::time::{Duration, Instant};

/// Lower bound on the refresh interval.
pub const MIN_STATS_INTERVAL: Duration = Duration::from_millis(100);

/// Performance, memory, world, and network counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    // Performance
    pub fps: f64,
    pub frame_time_ms: f64,
    pub update_time_ms: f64,
    pub render_time_ms: f64,

    // Memory
    pub ram_used_mb: u64,
    pub vram_used_mb: u64,
    pub vram_available_mb: u64,

    // World
    pub chunks_loaded: u32,
    pub entities_active: u32,
    pub faces_rendered: u32,

    // Network
    pub ping_ms: u32,
    pub packets_sent: u32,
    pub packets_received: u32,
    pub bandwidth_in_kbps: f32,
    pub bandwidth_out_kbps: f32,
}

/// Timings the simulation loop measured for its latest frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetrics {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub update_time_ms: f64,
    pub render_time_ms: f64,
}

impl FrameMetrics {
    fn apply(&self, stats: &mut EngineStats) {
        stats.fps = self.fps;
        stats.frame_time_ms = self.frame_time_ms;
        stats.update_time_ms = self.update_time_ms;
        stats.render_time_ms = self.render_time_ms;
    }
}

/// Snapshot cache refreshed no more often than its interval
#[derive(Debug, Clone)]
pub struct StatsCache {
    interval: Duration,
    last_refresh: Option<Instant>,
    snapshot: EngineStats,
    frame: FrameMetrics,
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(MIN_STATS_INTERVAL)
    }
}

impl StatsCache {
    /// Intervals below [`MIN_STATS_INTERVAL`] are raised to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_STATS_INTERVAL),
            last_refresh: None,
            snapshot: EngineStats::default(),
            frame: FrameMetrics::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Remember the latest frame timings; they land in the next refreshed snapshot.
    pub fn record_frame(&mut self, metrics: FrameMetrics) {
        self.frame = metrics;
    }

    /// The snapshot as of `now`, calling `gather` first if the cached one is stale.
    pub fn get(&mut self, now: Instant, gather: impl FnOnce(&mut EngineStats)) -> EngineStats {
        let stale = match self.last_refresh {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };

        if stale {
            let mut fresh = EngineStats::default();
            gather(&mut fresh);
            self.frame.apply(&mut fresh);
            self.snapshot = fresh;
            self.last_refresh = Some(now);
        }

        self.snapshot
    }

    /// The last snapshot without refreshing.
    pub fn cached(&self) -> EngineStats {
        self.snapshot
    }
}
