//! Ashborn Runtime - Engine lifecycle and frame loop
//!
//! Provides:
//! - `Engine` - staged subsystem start-up with rollback, and ordered shutdown
//! - `Application` - fixed-timestep simulation loop with pacing and pause
//! - `FrameClock` / `FixedStepper` / `FpsWindow` - timing building blocks
//! - `StatsCache` - interval-limited stats snapshot
//! - `Platform` - contract for window, renderer, input, audio, world, network and asset backends
//! - `HeadlessPlatform` - in-memory platform for servers and tests
//! - `Logging` - scoped tracing subscriber tied to the context's lifetime

mod app;
mod callbacks;
mod clock;
mod engine;
mod headless;
mod logging;
mod pacing;
mod platform;
mod stats;
mod timing;

pub use app::{run_application, Application, ApplicationError, LoopSettings, DEFAULT_MAX_DELTA_TIME};
pub use callbacks::Callbacks;
pub use clock::{FrameClock, ManualTime, MonotonicTime, TimeSource};
pub use engine::{Engine, EngineState, ExitHandle, ProfileScope, ShutdownReport};
pub use headless::{HeadlessPlatform, PlatformCall};
pub use logging::{LogError, Logging};
pub use pacing::{target_frame_time, FramePacer, PacingStrategy};
pub use platform::{Platform, PlatformEvent};
pub use stats::{EngineStats, FrameMetrics, StatsCache, MIN_STATS_INTERVAL};
pub use timing::{
    FixedStepper, FpsWindow, FrameTiming, StepOutcome, DEFAULT_FIXED_TIMESTEP, DEFAULT_FPS_WINDOW,
    DEFAULT_MAX_FIXED_STEPS,
};

pub use winit::keyboard::KeyCode;
