//! Frame timing snapshot, fixed-timestep accumulator, and rolling FPS window

use std::collections::VecDeque;

/// Per-frame timing handed to update and render callbacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Scaled and clamped time since last frame, in seconds
    pub delta_time: f64,
    /// Fixed timestep used by fixed updates, in seconds
    pub fixed_delta_time: f64,
    /// Multiplier applied to raw frame time (1.0 = normal speed)
    pub time_scale: f64,
    /// Sum of every `delta_time` so far
    pub total_time: f64,
    /// Frames completed so far
    pub frame_count: u64,
    /// Fraction of a fixed step left in the accumulator, in [0, 1)
    pub interpolation: f64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            delta_time: 0.0,
            fixed_delta_time: DEFAULT_FIXED_TIMESTEP,
            time_scale: 1.0,
            total_time: 0.0,
            frame_count: 0,
            interpolation: 0.0,
        }
    }
}

pub const DEFAULT_FIXED_TIMESTEP: f64 = 1.0 / 60.0;
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 5;

/// Result of draining the accumulator for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Fixed steps executed this frame
    pub steps: u32,
    /// The step cap was hit and leftover time was discarded
    pub clamped: bool,
    /// Accumulator divided by the fixed timestep after draining
    pub interpolation: f64,
}

/// Fixed-timestep accumulator.
///
/// Frame time is added to the accumulator, then drained in whole fixed
/// steps. At most `max_steps` run per frame; when more are owed the
/// accumulator is reset to zero instead of catching up.
#[derive(Debug, Clone)]
pub struct FixedStepper {
    fixed_timestep: f64,
    max_steps: u32,
    accumulator: f64,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_TIMESTEP)
    }
}

impl FixedStepper {
    pub fn new(fixed_timestep: f64) -> Self {
        Self {
            fixed_timestep,
            max_steps: DEFAULT_MAX_FIXED_STEPS,
            accumulator: 0.0,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn fixed_timestep(&self) -> f64 {
        self.fixed_timestep
    }

    pub fn set_fixed_timestep(&mut self, fixed_timestep: f64) {
        self.fixed_timestep = fixed_timestep;
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn interpolation(&self) -> f64 {
        self.accumulator / self.fixed_timestep
    }

    /// Accumulate `delta_time` and run `step` once per whole fixed timestep owed.
    ///
    /// A failing step stops draining and returns its error; the time for that
    /// step stays in the accumulator.
    pub fn advance<E>(
        &mut self,
        delta_time: f64,
        mut step: impl FnMut(f64) -> Result<(), E>,
    ) -> Result<StepOutcome, E> {
        self.accumulator += delta_time;

        let mut steps = 0;
        let mut clamped = false;
        while self.accumulator >= self.fixed_timestep {
            if steps == self.max_steps {
                clamped = true;
                self.accumulator = 0.0;
                break;
            }
            step(self.fixed_timestep)?;
            self.accumulator -= self.fixed_timestep;
            steps += 1;
        }

        Ok(StepOutcome {
            steps,
            clamped,
            interpolation: self.interpolation(),
        })
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

pub const DEFAULT_FPS_WINDOW: usize = 60;

/// Rolling window of raw frame durations for average FPS
#[derive(Debug, Clone)]
pub struct FpsWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}

impl FpsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one raw (unscaled, unclamped) frame duration in seconds.
    pub fn push(&mut self, raw_delta: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(raw_delta);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean frame duration over the recorded samples, in seconds.
    pub fn mean_frame_time(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Reciprocal of the mean frame duration; 0 with no samples.
    pub fn average_fps(&self) -> f64 {
        let mean = self.mean_frame_time();
        if mean > 0.0 {
            1.0 / mean
        } else {
            0.0
        }
    }
}
