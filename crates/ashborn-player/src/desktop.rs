//! Desktop platform backed by a winit window
//!
//! The engine owns the frame loop, so winit is driven by pumping its event
//! loop once per frame instead of handing control to `run_app`.

use ashborn_core::{
    validate_asset_paths, AssetConfig, AssetError, EngineConfig, RendererError, WindowError,
};
use ashborn_runtime::{Platform, PlatformEvent};
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

/// Pumps allowed for the window to appear after the event loop starts.
const CREATE_ATTEMPTS: usize = 50;
const CREATE_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// Receives winit callbacks while the event loop is pumped.
#[derive(Default)]
struct WindowHandler {
    pending: Option<WindowAttributes>,
    fullscreen: bool,
    monitor_index: i32,
    window: Option<Window>,
    create_error: Option<WindowError>,
    events: Vec<PlatformEvent>,
    close_requested: bool,
}

impl WindowHandler {
    fn create_window(&mut self, event_loop: &ActiveEventLoop, mut attributes: WindowAttributes) {
        if self.fullscreen {
            let monitor = if self.monitor_index < 0 {
                None
            } else {
                match event_loop
                    .available_monitors()
                    .nth(self.monitor_index as usize)
                {
                    Some(monitor) => Some(monitor),
                    None => {
                        self.create_error = Some(WindowError::MonitorNotFound(self.monitor_index));
                        return;
                    }
                }
            };
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(monitor)));
        }

        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(err) => self.create_error = Some(WindowError::WindowCreationFailed(err.to_string())),
        }
    }
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Some(attributes) = self.pending.take() {
                self.create_window(event_loop, attributes);
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                self.events.push(PlatformEvent::CloseRequested);
            }
            WindowEvent::Resized(size) => self.events.push(PlatformEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::Focused(focused) => self.events.push(PlatformEvent::Focused(focused)),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if !event.repeat {
                        self.events.push(PlatformEvent::Key {
                            code,
                            pressed: event.state == ElementState::Pressed,
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

/// A single native window plus the asset roots it was configured with.
///
/// There is no GPU backend behind the renderer stage; it only requires the
/// window to exist and marks frames as presented.
#[derive(Default)]
pub struct DesktopPlatform {
    event_loop: Option<EventLoop<()>>,
    handler: WindowHandler,
    surface_size: Option<PhysicalSize<u32>>,
    assets: AssetConfig,
    frame_limit: Option<u64>,
    polls: u64,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask to close after `frames` event polls.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    fn pump(&mut self, timeout: Duration) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(timeout), &mut self.handler) {
            tracing::info!(code, "event loop exited");
            self.handler.close_requested = true;
        }
    }
}

impl Platform for DesktopPlatform {
    fn init_window(&mut self, config: &EngineConfig) -> Result<(), WindowError> {
        // winit allows one event loop per process; keep it across restarts
        if self.event_loop.is_none() {
            let event_loop =
                EventLoop::new().map_err(|err| WindowError::BackendInitFailed(err.to_string()))?;
            event_loop.set_control_flow(ControlFlow::Poll);
            self.event_loop = Some(event_loop);
        }

        let window = &config.window;
        let attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(PhysicalSize::new(window.width, window.height))
            .with_resizable(window.resizable)
            .with_decorations(!window.borderless);
        self.handler.pending = Some(attributes);
        self.handler.fullscreen = window.fullscreen;
        self.handler.monitor_index = window.monitor_index;

        for _ in 0..CREATE_ATTEMPTS {
            self.pump(CREATE_PUMP_TIMEOUT);
            if let Some(err) = self.handler.create_error.take() {
                return Err(err);
            }
            if self.handler.window.is_some() {
                tracing::info!(
                    width = window.width,
                    height = window.height,
                    fullscreen = window.fullscreen,
                    "window created"
                );
                return Ok(());
            }
        }
        Err(WindowError::WindowCreationFailed(
            "event loop never resumed".to_string(),
        ))
    }

    fn init_renderer(&mut self, _config: &EngineConfig) -> Result<(), RendererError> {
        let window = self.handler.window.as_ref().ok_or(RendererError::NoSurface)?;
        self.surface_size = Some(window.inner_size());
        Ok(())
    }

    fn init_assets(&mut self, config: &EngineConfig) -> Result<(), AssetError> {
        validate_asset_paths(&config.assets)?;
        self.assets = config.assets.clone();
        Ok(())
    }

    fn shutdown_renderer(&mut self) -> Result<(), RendererError> {
        self.surface_size = None;
        Ok(())
    }

    fn shutdown_window(&mut self) -> Result<(), WindowError> {
        self.handler.window = None;
        self.handler.events.clear();
        // flush the destroy request
        self.pump(Duration::ZERO);
        Ok(())
    }

    fn poll_events(&mut self, events: &mut Vec<PlatformEvent>) {
        self.pump(Duration::ZERO);
        self.polls += 1;
        if self.frame_limit == Some(self.polls) {
            tracing::info!(frames = self.polls, "frame limit reached");
            self.handler.close_requested = true;
            self.handler.events.push(PlatformEvent::CloseRequested);
        }
        for event in self.handler.events.drain(..) {
            if let PlatformEvent::Resized { width, height } = event {
                self.surface_size = Some(PhysicalSize::new(width, height));
            }
            events.push(event);
        }
    }

    fn should_close(&self) -> bool {
        self.handler.close_requested
    }

    fn present(&mut self) -> Result<(), RendererError> {
        let window = self.handler.window.as_ref().ok_or(RendererError::NoSurface)?;
        if self.surface_size.is_none() {
            return Err(RendererError::NoSurface);
        }
        window.pre_present_notify();
        window.request_redraw();
        Ok(())
    }

    fn reload_shaders(&mut self) -> Result<(), RendererError> {
        if self.surface_size.is_none() {
            return Err(RendererError::NoSurface);
        }
        Ok(())
    }

    fn reload_assets(&mut self) -> Result<(), AssetError> {
        validate_asset_paths(&self.assets)
    }

    fn apply_config(&mut self, config: &EngineConfig) {
        if let Some(window) = &self.handler.window {
            window.set_title(&config.window.title);
        }
        self.assets = config.assets.clone();
    }
}
