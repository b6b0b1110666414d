//! Contract between the engine core and its external collaborators
//!
//! The window, renderer, input, audio, world, network, and asset backends all
//! sit behind one [`Platform`] value. The orchestrator only sees the `Result`
//! of each stage and the stage's [`SubsystemKind`]; it never looks inside.

use crate::stats::EngineStats;
use ashborn_core::{
    AssetError, AudioError, CoreError, EngineConfig, InputError, NetworkError, RendererError,
    SubsystemError, SubsystemKind, WindowError, WorldError,
};
use winit::keyboard::KeyCode;

/// A window or input event surfaced by [`Platform::poll_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Resized { width: u32, height: u32 },
    Focused(bool),
    CloseRequested,
    Key { code: KeyCode, pressed: bool },
}

/// Backends for every subsystem kind, plus the per-frame window services.
///
/// Each `init_*` stage receives the validated configuration. Each `shutdown_*`
/// is only called for a stage that started; it must not panic, and an error it
/// returns is recorded but never stops the teardown sequence.
///
/// Every method defaults to a successful no-op.
pub trait Platform {
    fn init_core(&mut self, _config: &EngineConfig) -> Result<(), CoreError> {
        Ok(())
    }
    fn init_window(&mut self, _config: &EngineConfig) -> Result<(), WindowError> {
        Ok(())
    }
    fn init_renderer(&mut self, _config: &EngineConfig) -> Result<(), RendererError> {
        Ok(())
    }
    fn init_input(&mut self, _config: &EngineConfig) -> Result<(), InputError> {
        Ok(())
    }
    fn init_audio(&mut self, _config: &EngineConfig) -> Result<(), AudioError> {
        Ok(())
    }
    fn init_world(&mut self, _config: &EngineConfig) -> Result<(), WorldError> {
        Ok(())
    }
    fn init_network(&mut self, _config: &EngineConfig) -> Result<(), NetworkError> {
        Ok(())
    }
    fn init_assets(&mut self, _config: &EngineConfig) -> Result<(), AssetError> {
        Ok(())
    }

    fn shutdown_core(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
    fn shutdown_window(&mut self) -> Result<(), WindowError> {
        Ok(())
    }
    fn shutdown_renderer(&mut self) -> Result<(), RendererError> {
        Ok(())
    }
    fn shutdown_input(&mut self) -> Result<(), InputError> {
        Ok(())
    }
    fn shutdown_audio(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
    fn shutdown_world(&mut self) -> Result<(), WorldError> {
        Ok(())
    }
    fn shutdown_network(&mut self) -> Result<(), NetworkError> {
        Ok(())
    }
    fn shutdown_assets(&mut self) -> Result<(), AssetError> {
        Ok(())
    }

    /// Append pending window and input events to `events`.
    fn poll_events(&mut self, _events: &mut Vec<PlatformEvent>) {}

    /// The window was asked to close.
    fn should_close(&self) -> bool {
        false
    }

    /// Hand the finished frame to the presentation target.
    fn present(&mut self) -> Result<(), RendererError> {
        Ok(())
    }

    /// Fill subsystem counters (memory, world, network) into `stats`.
    fn sample_stats(&self, _stats: &mut EngineStats) {}

    fn reload_shaders(&mut self) -> Result<(), RendererError> {
        Ok(())
    }

    fn reload_assets(&mut self) -> Result<(), AssetError> {
        Ok(())
    }

    /// A hot configuration update was accepted by the engine.
    fn apply_config(&mut self, _config: &EngineConfig) {}
}

/// Run the init stage for `kind`.
pub(crate) fn start_stage<P: Platform + ?Sized>(
    platform: &mut P,
    kind: SubsystemKind,
    config: &EngineConfig,
) -> Result<(), SubsystemError> {
    match kind {
        SubsystemKind::Core => platform.init_core(config)?,
        SubsystemKind::Window => platform.init_window(config)?,
        SubsystemKind::Renderer => platform.init_renderer(config)?,
        SubsystemKind::Input => platform.init_input(config)?,
        SubsystemKind::Audio => platform.init_audio(config)?,
        SubsystemKind::World => platform.init_world(config)?,
        SubsystemKind::Network => platform.init_network(config)?,
        SubsystemKind::Assets => platform.init_assets(config)?,
    }
    Ok(())
}

/// Run the teardown stage for `kind`.
pub(crate) fn stop_stage<P: Platform + ?Sized>(
    platform: &mut P,
    kind: SubsystemKind,
) -> Result<(), SubsystemError> {
    match kind {
        SubsystemKind::Core => platform.shutdown_core()?,
        SubsystemKind::Window => platform.shutdown_window()?,
        SubsystemKind::Renderer => platform.shutdown_renderer()?,
        SubsystemKind::Input => platform.shutdown_input()?,
        SubsystemKind::Audio => platform.shutdown_audio()?,
        SubsystemKind::World => platform.shutdown_world()?,
        SubsystemKind::Network => platform.shutdown_network()?,
        SubsystemKind::Assets => platform.shutdown_assets()?,
    }
    Ok(())
}

impl<P: Platform + ?Sized> Platform for Box<P> {
    fn init_core(&mut self, config: &EngineConfig) -> Result<(), CoreError> {
        (**self).init_core(config)
    }
    fn init_window(&mut self, config: &EngineConfig) -> Result<(), WindowError> {
        (**self).init_window(config)
    }
    fn init_renderer(&mut self, config: &EngineConfig) -> Result<(), RendererError> {
        (**self).init_renderer(config)
    }
    fn init_input(&mut self, config: &EngineConfig) -> Result<(), InputError> {
        (**self).init_input(config)
    }
    fn init_audio(&mut self, config: &EngineConfig) -> Result<(), AudioError> {
        (**self).init_audio(config)
    }
    fn init_world(&mut self, config: &EngineConfig) -> Result<(), WorldError> {
        (**self).init_world(config)
    }
    fn init_network(&mut self, config: &EngineConfig) -> Result<(), NetworkError> {
        (**self).init_network(config)
    }
    fn init_assets(&mut self, config: &EngineConfig) -> Result<(), AssetError> {
        (**self).init_assets(config)
    }
    fn shutdown_core(&mut self) -> Result<(), CoreError> {
        (**self).shutdown_core()
    }
    fn shutdown_window(&mut self) -> Result<(), WindowError> {
        (**self).shutdown_window()
    }
    fn shutdown_renderer(&mut self) -> Result<(), RendererError> {
        (**self).shutdown_renderer()
    }
    fn shutdown_input(&mut self) -> Result<(), InputError> {
        (**self).shutdown_input()
    }
    fn shutdown_audio(&mut self) -> Result<(), AudioError> {
        (**self).shutdown_audio()
    }
    fn shutdown_world(&mut self) -> Result<(), WorldError> {
        (**self).shutdown_world()
    }
    fn shutdown_network(&mut self) -> Result<(), NetworkError> {
        (**self).shutdown_network()
    }
    fn shutdown_assets(&mut self) -> Result<(), AssetError> {
        (**self).shutdown_assets()
    }
    fn poll_events(&mut self, events: &mut Vec<PlatformEvent>) {
        (**self).poll_events(events)
    }
    fn should_close(&self) -> bool {
        (**self).should_close()
    }
    fn present(&mut self) -> Result<(), RendererError> {
        (**self).present()
    }
    fn sample_stats(&self, stats: &mut EngineStats) {
        (**self).sample_stats(stats)
    }
    fn reload_shaders(&mut self) -> Result<(), RendererError> {
        (**self).reload_shaders()
    }
    fn reload_assets(&mut self) -> Result<(), AssetError> {
        (**self).reload_assets()
    }
    fn apply_config(&mut self, config: &EngineConfig) {
        (**self).apply_config(config)
    }
}
