//! Frame-rate pacing

use std::time::{Duration, Instant};

/// How the pacer waits out the remainder of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingStrategy {
    /// Sleep until `guard` before the deadline, then busy-wait the rest.
    /// Sub-millisecond accurate at the cost of CPU time.
    SleepThenSpin { guard: Duration },
    /// Sleep only. Cheaper, may overshoot by the scheduler's granularity.
    Sleep,
}

impl Default for PacingStrategy {
    fn default() -> Self {
        PacingStrategy::SleepThenSpin {
            guard: Duration::from_millis(1),
        }
    }
}

/// Holds each frame to a minimum wall-clock duration
#[derive(Debug, Clone, Copy, Default)]
pub struct FramePacer {
    pub strategy: PacingStrategy,
}

/// Minimum frame duration for a target rate; `None` when unlimited (0).
pub fn target_frame_time(target_fps: u32) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(target_fps)))
}

impl FramePacer {
    pub fn new(strategy: PacingStrategy) -> Self {
        Self { strategy }
    }

    /// Block until at least `1 / target_fps` has passed since `frame_start`.
    ///
    /// Returns the time spent waiting. Does nothing when `target_fps` is 0
    /// or the frame already overran.
    pub fn pace(&self, frame_start: Instant, target_fps: u32) -> Duration {
        let Some(target) = target_frame_time(target_fps) else {
            return Duration::ZERO;
        };

        let entered = Instant::now();
        let elapsed = entered.saturating_duration_since(frame_start);
        if elapsed >= target {
            return Duration::ZERO;
        }
        let deadline = frame_start + target;

        match self.strategy {
            PacingStrategy::SleepThenSpin { guard } => {
                let remaining = target - elapsed;
                if remaining > guard {
                    std::thread::sleep(remaining - guard);
                }
                while Instant::now() < deadline {
                    std::hint::spin_loop();
                }
            }
            PacingStrategy::Sleep => {
                // sleep may wake early on some platforms
                loop {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    std::thread::sleep(deadline - now);
                }
            }
        }

        entered.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_does_not_wait() {
        let pacer = FramePacer::default();
        let start = Instant::now();
        assert_eq!(pacer.pace(start, 0), Duration::ZERO);
        assert!(target_frame_time(0).is_none());
    }

    #[test]
    fn test_overrun_frame_does_not_wait() {
        let pacer = FramePacer::default();
        let start = Instant::now() - Duration::from_millis(100);
        assert_eq!(pacer.pace(start, 30), Duration::ZERO);
    }

    #[test]
    fn test_sleep_then_spin_meets_target() {
        let pacer = FramePacer::default();
        let target = Duration::from_secs_f64(1.0 / 30.0);
        for _ in 0..3 {
            let start = Instant::now();
            pacer.pace(start, 30);
            assert!(start.elapsed() >= target);
        }
    }

    #[test]
    fn test_sleep_only_meets_target() {
        let pacer = FramePacer::new(PacingStrategy::Sleep);
        let target = Duration::from_secs_f64(1.0 / 60.0);
        let start = Instant::now();
        pacer.pace(start, 60);
        assert!(start.elapsed() >= target);
    }
}
