//! In-memory platform with no window or devices
//!
//! Used for dedicated-server style runs and for exercising the orchestrator
//! and loop: stages can be told to fail, every call is logged in order, and
//! window events can be scripted against the frame they arrive on.

use crate::platform::{Platform, PlatformEvent};
use crate::stats::EngineStats;
use ashborn_core::{
    AssetError, AudioError, CoreError, EngineConfig, InputError, NetworkError, RendererError,
    SubsystemKind, WindowError, WorldError,
};
use std::collections::HashSet;

const INJECTED: &str = "injected failure";

/// One call the engine made into the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    Init(SubsystemKind),
    Shutdown(SubsystemKind),
    Present,
    ReloadShaders,
    ReloadAssets,
    ApplyConfig,
}

#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    calls: Vec<PlatformCall>,
    init_failures: HashSet<SubsystemKind>,
    shutdown_failures: HashSet<SubsystemKind>,
    scripted: Vec<(u64, PlatformEvent)>,
    polls: u64,
    presents: u64,
    close_after: Option<u64>,
    close_requested: bool,
    fail_present_at: Option<u64>,
    counters: EngineStats,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the init stage for `kind` fail.
    pub fn fail_init(mut self, kind: SubsystemKind) -> Self {
        self.init_failures.insert(kind);
        self
    }

    /// Make the teardown stage for `kind` report an error.
    pub fn fail_shutdown(mut self, kind: SubsystemKind) -> Self {
        self.shutdown_failures.insert(kind);
        self
    }

    /// Report a close request once `frames` event polls have happened.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Fail the `nth` (1-based) present call.
    pub fn fail_present_at(mut self, nth: u64) -> Self {
        self.fail_present_at = Some(nth);
        self
    }

    /// Counters reported by [`Platform::sample_stats`].
    pub fn with_counters(mut self, counters: EngineStats) -> Self {
        self.counters = counters;
        self
    }

    /// Deliver `event` on the `frame`th poll (1-based).
    pub fn push_event_at(&mut self, frame: u64, event: PlatformEvent) {
        self.scripted.push((frame, event));
    }

    /// Deliver `event` on the next poll.
    pub fn push_event(&mut self, event: PlatformEvent) {
        self.scripted.push((self.polls + 1, event));
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[PlatformCall] {
        &self.calls
    }

    /// Subsystems whose init stage was entered, in order.
    pub fn started(&self) -> Vec<SubsystemKind> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Init(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Subsystems whose teardown stage was entered, in order.
    pub fn stopped(&self) -> Vec<SubsystemKind> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Shutdown(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    fn enter_init(&mut self, kind: SubsystemKind) -> bool {
        self.calls.push(PlatformCall::Init(kind));
        self.init_failures.contains(&kind)
    }

    fn enter_shutdown(&mut self, kind: SubsystemKind) -> bool {
        self.calls.push(PlatformCall::Shutdown(kind));
        self.shutdown_failures.contains(&kind)
    }
}

impl Platform for HeadlessPlatform {
    fn init_core(&mut self, _config: &EngineConfig) -> Result<(), CoreError> {
        if self.enter_init(SubsystemKind::Core) {
            return Err(CoreError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn init_window(&mut self, _config: &EngineConfig) -> Result<(), WindowError> {
        if self.enter_init(SubsystemKind::Window) {
            return Err(WindowError::WindowCreationFailed(INJECTED.into()));
        }
        Ok(())
    }

    fn init_renderer(&mut self, _config: &EngineConfig) -> Result<(), RendererError> {
        if self.enter_init(SubsystemKind::Renderer) {
            return Err(RendererError::NoSuitableGpu);
        }
        Ok(())
    }

    fn init_input(&mut self, _config: &EngineConfig) -> Result<(), InputError> {
        if self.enter_init(SubsystemKind::Input) {
            return Err(InputError::DeviceNotFound);
        }
        Ok(())
    }

    fn init_audio(&mut self, _config: &EngineConfig) -> Result<(), AudioError> {
        if self.enter_init(SubsystemKind::Audio) {
            return Err(AudioError::NoOutputDevice);
        }
        Ok(())
    }

    fn init_world(&mut self, _config: &EngineConfig) -> Result<(), WorldError> {
        if self.enter_init(SubsystemKind::World) {
            return Err(WorldError::ChunkGenerationFailed);
        }
        Ok(())
    }

    fn init_network(&mut self, config: &EngineConfig) -> Result<(), NetworkError> {
        if self.enter_init(SubsystemKind::Network) {
            return Err(NetworkError::PortBindFailed(config.network.port));
        }
        Ok(())
    }

    fn init_assets(&mut self, _config: &EngineConfig) -> Result<(), AssetError> {
        if self.enter_init(SubsystemKind::Assets) {
            return Err(AssetError::InitializationFailed(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_core(&mut self) -> Result<(), CoreError> {
        if self.enter_shutdown(SubsystemKind::Core) {
            return Err(CoreError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_window(&mut self) -> Result<(), WindowError> {
        if self.enter_shutdown(SubsystemKind::Window) {
            return Err(WindowError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_renderer(&mut self) -> Result<(), RendererError> {
        if self.enter_shutdown(SubsystemKind::Renderer) {
            return Err(RendererError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_input(&mut self) -> Result<(), InputError> {
        if self.enter_shutdown(SubsystemKind::Input) {
            return Err(InputError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_audio(&mut self) -> Result<(), AudioError> {
        if self.enter_shutdown(SubsystemKind::Audio) {
            return Err(AudioError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_world(&mut self) -> Result<(), WorldError> {
        if self.enter_shutdown(SubsystemKind::World) {
            return Err(WorldError::SerializationFailed(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_network(&mut self) -> Result<(), NetworkError> {
        if self.enter_shutdown(SubsystemKind::Network) {
            return Err(NetworkError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn shutdown_assets(&mut self) -> Result<(), AssetError> {
        if self.enter_shutdown(SubsystemKind::Assets) {
            return Err(AssetError::Other(INJECTED.into()));
        }
        Ok(())
    }

    fn poll_events(&mut self, events: &mut Vec<PlatformEvent>) {
        self.polls += 1;
        let polls = self.polls;
        self.scripted.retain(|(frame, event)| {
            if *frame <= polls {
                events.push(*event);
                false
            } else {
                true
            }
        });

        if self.close_after.is_some_and(|limit| polls >= limit) && !self.close_requested {
            self.close_requested = true;
            events.push(PlatformEvent::CloseRequested);
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn present(&mut self) -> Result<(), RendererError> {
        self.calls.push(PlatformCall::Present);
        self.presents += 1;
        if self.fail_present_at == Some(self.presents) {
            return Err(RendererError::SwapchainCreationFailed);
        }
        Ok(())
    }

    fn sample_stats(&self, stats: &mut EngineStats) {
        stats.ram_used_mb = self.counters.ram_used_mb;
        stats.vram_used_mb = self.counters.vram_used_mb;
        stats.vram_available_mb = self.counters.vram_available_mb;
        stats.chunks_loaded = self.counters.chunks_loaded;
        stats.entities_active = self.counters.entities_active;
        stats.faces_rendered = self.counters.faces_rendered;
        stats.ping_ms = self.counters.ping_ms;
        stats.packets_sent = self.counters.packets_sent;
        stats.packets_received = self.counters.packets_received;
        stats.bandwidth_in_kbps = self.counters.bandwidth_in_kbps;
        stats.bandwidth_out_kbps = self.counters.bandwidth_out_kbps;
    }

    fn reload_shaders(&mut self) -> Result<(), RendererError> {
        self.calls.push(PlatformCall::ReloadShaders);
        Ok(())
    }

    fn reload_assets(&mut self) -> Result<(), AssetError> {
        self.calls.push(PlatformCall::ReloadAssets);
        Ok(())
    }

    fn apply_config(&mut self, _config: &EngineConfig) {
        self.calls.push(PlatformCall::ApplyConfig);
    }
}
