//! Fixed-timestep simulation loop
//!
//! One frame: sample the clock, scale and clamp the delta, poll platform
//! events, drain the fixed-step accumulator, run update, render and GUI,
//! present, then pace to the target rate. Pausing skips the simulation and
//! drawing callbacks but still polls events and presents.

use crate::callbacks::Callbacks;
use crate::clock::{FrameClock, TimeSource};
use crate::engine::{Engine, ExitHandle};
use crate::logging::Logging;
use crate::pacing::{target_frame_time, FramePacer, PacingStrategy};
use crate::platform::{Platform, PlatformEvent};
use crate::stats::FrameMetrics;
use crate::timing::{
    FixedStepper, FpsWindow, FrameTiming, DEFAULT_FIXED_TIMESTEP, DEFAULT_FPS_WINDOW,
    DEFAULT_MAX_FIXED_STEPS,
};
use ashborn_core::{EngineConfig, EngineError};
use std::time::Instant;
use thiserror::Error;
use winit::keyboard::KeyCode;

pub const DEFAULT_MAX_DELTA_TIME: f64 = 0.25;
const MIN_STEP: f64 = 0.001;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Engine initialization failed: {0}")]
    EngineInitFailed(#[source] EngineError),

    #[error("Application is already running")]
    AlreadyRunning,

    #[error("Application is not initialized")]
    NotInitialized,

    #[error("Update failed: {0:#}")]
    UpdateFailed(anyhow::Error),

    #[error("Render failed: {0:#}")]
    RenderFailed(anyhow::Error),

    #[error("Engine shutdown failed: {0}")]
    ShutdownFailed(#[source] EngineError),
}

/// Tunables for the loop. The target frame rate comes from the engine config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub fixed_timestep: f64,
    pub max_delta_time: f64,
    pub time_scale: f64,
    pub max_fixed_steps: u32,
    pub fps_window: usize,
    pub pacing: PacingStrategy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            max_delta_time: DEFAULT_MAX_DELTA_TIME,
            time_scale: 1.0,
            max_fixed_steps: DEFAULT_MAX_FIXED_STEPS,
            fps_window: DEFAULT_FPS_WINDOW,
            pacing: PacingStrategy::default(),
        }
    }
}

/// Drives an [`Engine`] one frame at a time.
pub struct Application<P: Platform> {
    engine: Engine<P>,
    callbacks: Callbacks,
    clock: FrameClock,
    stepper: FixedStepper,
    fps_window: FpsWindow,
    pacer: FramePacer,
    time_scale: f64,
    max_delta_time: f64,
    target_fps: u32,
    timing: FrameTiming,
    events: Vec<PlatformEvent>,
    /// Between `on_start` and `on_shutdown`
    active: bool,
}

impl<P: Platform> Application<P> {
    pub fn new(config: EngineConfig, callbacks: Callbacks, platform: P) -> Self {
        Self::with_settings(config, callbacks, platform, LoopSettings::default())
    }

    pub fn with_settings(
        config: EngineConfig,
        callbacks: Callbacks,
        platform: P,
        settings: LoopSettings,
    ) -> Self {
        let target_fps = config.target_fps;
        let fixed_timestep = settings.fixed_timestep.max(MIN_STEP);
        Self {
            engine: Engine::new(config, platform),
            callbacks,
            clock: FrameClock::new(),
            stepper: FixedStepper::new(fixed_timestep).with_max_steps(settings.max_fixed_steps),
            fps_window: FpsWindow::new(settings.fps_window),
            pacer: FramePacer::new(settings.pacing),
            time_scale: settings.time_scale.max(0.0),
            max_delta_time: settings.max_delta_time.max(MIN_STEP),
            target_fps,
            timing: FrameTiming {
                fixed_delta_time: fixed_timestep,
                time_scale: settings.time_scale.max(0.0),
                ..FrameTiming::default()
            },
            events: Vec::new(),
            active: false,
        }
    }

    /// Replace the frame clock's time source. Pacing always uses real time.
    pub fn with_time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.clock = FrameClock::with_source(source);
        self
    }

    /// Initialize the engine, call `on_start` and run frames until told to stop.
    ///
    /// If [`Application::initialize`] already ran, the loop starts directly
    /// and `on_start` is not called again. The engine is shut down on every
    /// exit path, including a failed frame; `on_shutdown` runs exactly once
    /// before that.
    pub fn run(&mut self) -> Result<(), ApplicationError> {
        if !(self.active && self.engine.is_initialized()) {
            self.initialize()?;
        }
        tracing::info!(target_fps = self.target_fps, "entering main loop");

        let result = loop {
            if self.should_close() {
                break Ok(());
            }
            if let Err(err) = self.run_frame() {
                tracing::error!(error = %err, frame = self.timing.frame_count, "frame failed");
                break Err(err);
            }
        };

        self.finish();
        let report = self.engine.shutdown();

        tracing::info!(
            frames = self.timing.frame_count,
            total_time = self.timing.total_time,
            "main loop ended"
        );

        match (result, report) {
            (Err(err), _) => Err(err),
            (Ok(()), Err(err)) => Err(ApplicationError::ShutdownFailed(err)),
            (Ok(()), Ok(report)) => {
                if !report.is_clean() {
                    tracing::warn!(failures = report.failures.len(), "shutdown finished with teardown errors");
                }
                Ok(())
            }
        }
    }

    /// Initialize the engine and call `on_start`, for callers that drive
    /// frames with [`Application::run_frame`] themselves.
    pub fn initialize(&mut self) -> Result<(), ApplicationError> {
        if self.active || self.engine.is_initialized() {
            return Err(ApplicationError::AlreadyRunning);
        }
        self.engine
            .initialize()
            .map_err(ApplicationError::EngineInitFailed)?;

        self.clock.reset();
        self.stepper.reset();
        self.active = true;
        self.callbacks.start();
        Ok(())
    }

    /// Run a single frame.
    ///
    /// On error the frame is abandoned; shutting down is left to the caller.
    pub fn run_frame(&mut self) -> Result<(), ApplicationError> {
        if !self.active || !self.engine.is_initialized() {
            return Err(ApplicationError::NotInitialized);
        }
        let frame_start = Instant::now();

        let raw_delta = self.clock.sample();
        let delta_time = (raw_delta * self.time_scale).min(self.max_delta_time);
        self.timing.delta_time = delta_time;
        self.timing.time_scale = self.time_scale;
        self.timing.fixed_delta_time = self.stepper.fixed_timestep();
        self.timing.total_time += delta_time;
        self.fps_window.push(raw_delta);

        self.process_events();

        let mut update_time_ms = 0.0;
        let mut render_time_ms = 0.0;
        if !self.engine.is_paused() {
            let update_start = Instant::now();
            let callbacks = &mut self.callbacks;
            let outcome = self
                .stepper
                .advance(delta_time, |dt| callbacks.fixed_update(dt))
                .map_err(ApplicationError::UpdateFailed)?;
            if outcome.clamped {
                tracing::warn!(
                    steps = outcome.steps,
                    delta_time,
                    "fixed update fell behind, dropping accumulated time"
                );
            }
            self.timing.interpolation = outcome.interpolation;

            self.callbacks
                .update(&self.timing)
                .map_err(ApplicationError::UpdateFailed)?;
            update_time_ms = update_start.elapsed().as_secs_f64() * 1000.0;

            let render_start = Instant::now();
            self.callbacks
                .render(&self.timing)
                .map_err(ApplicationError::RenderFailed)?;
            self.callbacks.gui();
            render_time_ms = render_start.elapsed().as_secs_f64() * 1000.0;
        }

        self.engine
            .platform_mut()
            .present()
            .map_err(|err| ApplicationError::RenderFailed(anyhow::Error::new(err).context("present failed")))?;

        let waited = self.pacer.pace(frame_start, self.target_fps);
        if let Some(target) = target_frame_time(self.target_fps) {
            let elapsed = frame_start.elapsed();
            if waited.is_zero() && elapsed > target {
                tracing::debug!(
                    frame = self.timing.frame_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    target_ms = target.as_secs_f64() * 1000.0,
                    "frame overran target"
                );
            }
        }

        self.timing.frame_count += 1;
        self.engine.record_frame(FrameMetrics {
            fps: self.fps(),
            frame_time_ms: self.frame_time_ms(),
            update_time_ms,
            render_time_ms,
        });
        Ok(())
    }

    fn process_events(&mut self) {
        let mut events = std::mem::take(&mut self.events);
        self.engine.platform_mut().poll_events(&mut events);

        for event in events.drain(..) {
            match event {
                PlatformEvent::Resized { width, height } => {
                    tracing::debug!(width, height, "window resized");
                    self.callbacks.resize(width, height);
                }
                PlatformEvent::Focused(focused) => {
                    tracing::debug!(focused, "focus changed");
                    self.callbacks.focus_changed(focused);
                }
                PlatformEvent::CloseRequested => {
                    tracing::info!("close requested by window");
                    self.engine.request_exit();
                }
                PlatformEvent::Key { code, pressed } => {
                    self.callbacks.key(code, pressed);
                    if code == KeyCode::Escape && pressed {
                        self.request_exit();
                    }
                }
            }
        }

        self.events = events;
    }

    /// Call `on_shutdown` if the loop is still active.
    fn finish(&mut self) {
        if self.active {
            self.active = false;
            self.callbacks.shutdown();
        }
    }

    /// The engine stopped running or the window asked to close.
    pub fn should_close(&self) -> bool {
        !self.engine.is_running() || self.engine.platform().should_close()
    }

    pub fn request_exit(&self) {
        self.engine.request_exit();
    }

    pub fn exit_handle(&self) -> ExitHandle {
        self.engine.exit_handle()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.engine.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    /// Negative scales are treated as 0 (frozen).
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
        tracing::debug!(time_scale = self.time_scale, "time scale set");
    }

    pub fn set_fixed_timestep(&mut self, step: f64) {
        let step = step.max(MIN_STEP);
        self.stepper.set_fixed_timestep(step);
        self.timing.fixed_delta_time = step;
        tracing::debug!(fixed_timestep = step, "fixed timestep set");
    }

    /// 0 = unlimited.
    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps;
        tracing::debug!(target_fps = fps, "target fps set");
    }

    pub fn set_max_delta_time(&mut self, max: f64) {
        self.max_delta_time = max.max(MIN_STEP);
        tracing::debug!(max_delta_time = self.max_delta_time, "max delta time set");
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn max_delta_time(&self) -> f64 {
        self.max_delta_time
    }

    /// Reciprocal of the last frame's delta; 0 when the delta was 0.
    pub fn fps(&self) -> f64 {
        if self.timing.delta_time > 0.0 {
            1.0 / self.timing.delta_time
        } else {
            0.0
        }
    }

    /// Reciprocal of the mean raw frame time over the rolling window.
    pub fn average_fps(&self) -> f64 {
        self.fps_window.average_fps()
    }

    /// Last frame's delta in milliseconds.
    pub fn frame_time_ms(&self) -> f64 {
        self.timing.delta_time * 1000.0
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn engine(&self) -> &Engine<P> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<P> {
        &mut self.engine
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }
}

impl<P: Platform> Drop for Application<P> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Set up logging, run an application to completion and map the outcome
/// to a process exit code: 0 on success, 1 on failure.
pub fn run_application<P: Platform>(config: EngineConfig, callbacks: Callbacks, platform: P) -> i32 {
    let _logging = match Logging::init(&config) {
        Ok(logging) => Some(logging),
        Err(err) => {
            eprintln!("Logging unavailable: {err}");
            None
        }
    };

    let mut app = Application::new(config, callbacks, platform);
    match app.run() {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "application failed");
            1
        }
    }
}
