//! Subsystem orchestrator
//!
//! Brings the subsystems up in [`SubsystemKind::START_ORDER`], rolls back
//! everything already started when a critical stage fails, and tears down in
//! [`SubsystemKind::SHUTDOWN_ORDER`].

use crate::platform::{start_stage, stop_stage, Platform};
use crate::stats::{EngineStats, FrameMetrics, StatsCache};
use ashborn_core::{
    EngineConfig, EngineError, NetworkMode, Result, SubsystemError, SubsystemKind,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    ShuttingDown,
    Shutdown,
}

/// Cloneable handle that can stop the engine from any thread.
///
/// The request is advisory: the loop observes it at the top of its next frame.
#[derive(Debug, Clone)]
pub struct ExitHandle {
    running: Arc<AtomicBool>,
}

impl ExitHandle {
    pub fn request_exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// What a shutdown did.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Live subsystems torn down, in teardown order
    pub stopped: Vec<SubsystemKind>,
    /// Teardown stages that reported an error; the sequence continued past each
    pub failures: Vec<(SubsystemKind, SubsystemError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Emits a trace record with the elapsed time when dropped.
///
/// Inert unless profiling is enabled in the configuration.
#[must_use = "the scope is measured until the guard is dropped"]
pub struct ProfileScope {
    active: Option<(String, Instant)>,
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if let Some((name, start)) = self.active.take() {
            tracing::trace!(
                name = %name,
                elapsed_us = start.elapsed().as_micros() as u64,
                "profile"
            );
        }
    }
}

/// Owns the subsystem set and its lifecycle.
pub struct Engine<P: Platform> {
    config: EngineConfig,
    platform: P,
    state: EngineState,
    live: [bool; SubsystemKind::START_ORDER.len()],
    running: Arc<AtomicBool>,
    paused: bool,
    started_at: Option<Instant>,
    stats: StatsCache,
}

impl<P: Platform> Engine<P> {
    /// Create an engine. Nothing is validated or started until [`Engine::initialize`].
    pub fn new(config: EngineConfig, platform: P) -> Self {
        tracing::info!(
            title = %config.window.title,
            network = config.network.mode.name(),
            "engine created"
        );
        Self {
            config,
            platform,
            state: EngineState::Uninitialized,
            live: [false; SubsystemKind::START_ORDER.len()],
            running: Arc::new(AtomicBool::new(false)),
            paused: false,
            started_at: None,
            stats: StatsCache::default(),
        }
    }

    /// Validate the configuration and start every subsystem in order.
    ///
    /// A critical stage failure rolls back the stages that already started,
    /// in reverse, and leaves the engine `Uninitialized`. Audio and network
    /// failures only degrade: audio stays off, network falls back to offline.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            EngineState::Uninitialized => {}
            EngineState::Shutdown => return Err(EngineError::AlreadyShutDown),
            _ => return Err(EngineError::AlreadyInitialized),
        }

        self.config.validate()?;

        tracing::info!("initializing engine");
        self.state = EngineState::Initializing;

        for kind in SubsystemKind::START_ORDER {
            if kind == SubsystemKind::Network && self.config.network.mode.is_offline() {
                tracing::info!(subsystem = %kind, "skipped (offline)");
                continue;
            }

            match start_stage(&mut self.platform, kind, &self.config) {
                Ok(()) => {
                    self.live[kind.ordinal()] = true;
                    tracing::info!(subsystem = %kind, "subsystem started");
                }
                Err(err) if !kind.is_critical() => {
                    tracing::warn!(subsystem = %kind, error = %err, "subsystem unavailable, continuing without it");
                    if kind == SubsystemKind::Network {
                        self.config.network.mode = NetworkMode::Offline;
                        tracing::warn!("network downgraded to offline");
                    }
                }
                Err(err) => {
                    tracing::error!(subsystem = %kind, error = %err, "subsystem failed to start");
                    self.roll_back();
                    self.state = EngineState::Uninitialized;
                    return Err(EngineError::subsystem(kind, err));
                }
            }
        }

        self.state = EngineState::Running;
        self.paused = false;
        self.running.store(true, Ordering::SeqCst);
        self.started_at = Some(Instant::now());

        tracing::info!(
            live = self.live.iter().filter(|live| **live).count(),
            "engine initialization complete"
        );
        Ok(())
    }

    /// Stop every live subsystem, newest first. Errors are logged and dropped.
    fn roll_back(&mut self) {
        for kind in SubsystemKind::START_ORDER.into_iter().rev() {
            if !self.live[kind.ordinal()] {
                continue;
            }
            tracing::info!(subsystem = %kind, "rolling back");
            if let Err(err) = stop_stage(&mut self.platform, kind) {
                tracing::warn!(subsystem = %kind, error = %err, "rollback teardown failed");
            }
            self.live[kind.ordinal()] = false;
        }
    }

    /// Tear down all live subsystems in shutdown order.
    ///
    /// Teardown errors are collected in the report and never stop the
    /// sequence; the engine always ends up `Shutdown`.
    pub fn shutdown(&mut self) -> Result<ShutdownReport> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        tracing::info!("shutting down engine");
        self.state = EngineState::ShuttingDown;
        self.running.store(false, Ordering::SeqCst);

        let mut report = ShutdownReport::default();
        for kind in SubsystemKind::SHUTDOWN_ORDER {
            if !self.live[kind.ordinal()] {
                continue;
            }
            match stop_stage(&mut self.platform, kind) {
                Ok(()) => tracing::debug!(subsystem = %kind, "subsystem stopped"),
                Err(err) => {
                    tracing::warn!(subsystem = %kind, error = %err, "subsystem teardown failed");
                    report.failures.push((kind, err));
                }
            }
            self.live[kind.ordinal()] = false;
            report.stopped.push(kind);
        }

        self.state = EngineState::Shutdown;
        self.paused = false;
        self.started_at = None;

        tracing::info!(
            stopped = report.stopped.len(),
            failures = report.failures.len(),
            "engine shutdown complete"
        );
        Ok(report)
    }

    pub fn state(&self) -> EngineState {
        match self.state {
            EngineState::Running if self.paused => EngineState::Paused,
            state => state,
        }
    }

    /// Initialization finished and shutdown has not started.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, EngineState::Running | EngineState::Paused)
    }

    /// Initialized and no exit has been requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            tracing::info!(paused, "pause state changed");
        }
    }

    pub fn request_exit(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("exit requested");
    }

    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Whether `kind` started and has not been torn down.
    pub fn is_live(&self, kind: SubsystemKind) -> bool {
        self.live[kind.ordinal()]
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seconds since initialization completed; 0 when not initialized.
    pub fn uptime(&self) -> f64 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Replace the configuration.
    ///
    /// Before initialization the new configuration is taken as-is. While
    /// running, fields that need a restart keep their current value and are
    /// logged; the rest take effect immediately. If the merged result fails
    /// validation the running configuration is left untouched. The update is
    /// best-effort, not atomic across subsystems.
    pub fn update_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;

        if !self.is_initialized() {
            self.config = config;
            tracing::info!("config replaced");
            return Ok(());
        }

        let update = self.config.hot_update(&config);
        if !update.deferred.is_empty() {
            tracing::warn!(fields = ?update.deferred, "config changes need a restart to take effect");
        }
        // merged values can break cross-field rules the incoming config satisfied
        update.config.validate()?;
        self.config = update.config;
        self.platform.apply_config(&self.config);
        tracing::info!("config updated");
        Ok(())
    }

    /// Load a configuration file and apply it through [`Engine::update_config`].
    pub fn reload_config(&mut self, path: &Path) -> Result<()> {
        let config = EngineConfig::load(path)?;
        tracing::info!(path = %path.display(), "reloading config");
        self.update_config(config)
    }

    pub fn reload_shaders(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        tracing::info!("reloading shaders");
        self.platform
            .reload_shaders()
            .map_err(|err| EngineError::subsystem(SubsystemKind::Renderer, err))
    }

    pub fn reload_assets(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        tracing::info!("reloading assets");
        self.platform
            .reload_assets()
            .map_err(|err| EngineError::subsystem(SubsystemKind::Assets, err))
    }

    /// Current stats, re-gathered at most once per refresh interval.
    pub fn stats(&mut self) -> EngineStats {
        let platform = &self.platform;
        let initialized = self.is_initialized();
        self.stats.get(Instant::now(), |stats| {
            if initialized {
                platform.sample_stats(stats);
            }
        })
    }

    /// Store the loop's timings for the next stats refresh.
    pub fn record_frame(&mut self, metrics: FrameMetrics) {
        self.stats.record_frame(metrics);
    }

    /// Time a named scope; see [`ProfileScope`].
    pub fn profile(&self, name: impl Into<String>) -> ProfileScope {
        ProfileScope {
            active: self
                .config
                .enable_profiling
                .then(|| (name.into(), Instant::now())),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<P: Platform> Drop for Engine<P> {
    fn drop(&mut self) {
        if self.is_initialized() {
            tracing::warn!("engine dropped while initialized, shutting down");
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessPlatform, PlatformCall};
    use ashborn_core::{ConfigError, NetworkMode};

    fn online_config() -> EngineConfig {
        let mut config = EngineConfig::minimal();
        config.network.mode = NetworkMode::P2pHost;
        config
    }

    #[test]
    fn test_initialize_starts_everything_in_order() {
        let mut engine = Engine::new(online_config(), HeadlessPlatform::new());
        engine.initialize().unwrap();

        assert_eq!(engine.state(), EngineState::Running);
        assert!(engine.is_initialized());
        assert!(engine.is_running());
        assert_eq!(engine.platform().started(), SubsystemKind::START_ORDER.to_vec());
        assert!(SubsystemKind::START_ORDER.iter().all(|k| engine.is_live(*k)));
    }

    #[test]
    fn test_offline_mode_skips_network() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();
        assert!(!engine.platform().started().contains(&SubsystemKind::Network));
        assert!(!engine.is_live(SubsystemKind::Network));
    }

    #[test]
    fn test_invalid_config_touches_no_subsystem() {
        let mut config = EngineConfig::minimal();
        config.world.chunk_size = 24;
        let mut engine = Engine::new(config, HeadlessPlatform::new());

        let err = engine.initialize().unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidConfiguration(ConfigError::InvalidChunkSize(24))
        ));
        assert!(engine.platform().calls().is_empty());
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_critical_failure_rolls_back_in_reverse_at_every_position() {
        let critical: Vec<SubsystemKind> = SubsystemKind::START_ORDER
            .into_iter()
            .filter(|k| k.is_critical())
            .collect();

        for failing in critical {
            let platform = HeadlessPlatform::new().fail_init(failing);
            let mut engine = Engine::new(online_config(), platform);

            let err = engine.initialize().unwrap_err();
            match err {
                EngineError::SubsystemFailure { subsystem, .. } => assert_eq!(subsystem, failing),
                other => panic!("unexpected error {other:?}"),
            }

            let before: Vec<SubsystemKind> = SubsystemKind::START_ORDER
                .into_iter()
                .take_while(|k| *k != failing)
                .collect();
            let expected: Vec<SubsystemKind> = before.into_iter().rev().collect();
            assert_eq!(engine.platform().stopped(), expected, "failing at {failing}");
            assert_eq!(engine.state(), EngineState::Uninitialized);
            assert!(!engine.is_running());
            assert!(SubsystemKind::START_ORDER.iter().all(|k| !engine.is_live(*k)));
        }
    }

    #[test]
    fn test_rollback_skips_subsystems_that_never_started() {
        let platform = HeadlessPlatform::new()
            .fail_init(SubsystemKind::Audio)
            .fail_init(SubsystemKind::Network)
            .fail_init(SubsystemKind::Assets);
        let mut engine = Engine::new(online_config(), platform);
        assert!(engine.initialize().is_err());

        use SubsystemKind::*;
        assert_eq!(
            engine.platform().stopped(),
            vec![World, Input, Renderer, Window, Core]
        );
    }

    #[test]
    fn test_rollback_continues_past_teardown_errors() {
        let platform = HeadlessPlatform::new()
            .fail_init(SubsystemKind::Input)
            .fail_shutdown(SubsystemKind::Renderer);
        let mut engine = Engine::new(EngineConfig::minimal(), platform);
        assert!(engine.initialize().is_err());

        use SubsystemKind::*;
        assert_eq!(engine.platform().stopped(), vec![Renderer, Window, Core]);
    }

    #[test]
    fn test_audio_failure_is_not_fatal() {
        let platform = HeadlessPlatform::new().fail_init(SubsystemKind::Audio);
        let mut engine = Engine::new(EngineConfig::minimal(), platform);
        engine.initialize().unwrap();

        assert!(engine.is_running());
        assert!(!engine.is_live(SubsystemKind::Audio));
        assert!(engine.platform().stopped().is_empty());
    }

    #[test]
    fn test_network_failure_downgrades_to_offline() {
        let platform = HeadlessPlatform::new().fail_init(SubsystemKind::Network);
        let mut engine = Engine::new(online_config(), platform);
        engine.initialize().unwrap();

        assert!(engine.is_running());
        assert_eq!(engine.config().network.mode, NetworkMode::Offline);
        assert!(engine.is_live(SubsystemKind::Assets));
    }

    #[test]
    fn test_shutdown_runs_in_reverse_order() {
        let mut engine = Engine::new(online_config(), HeadlessPlatform::new());
        engine.initialize().unwrap();
        let report = engine.shutdown().unwrap();

        assert!(report.is_clean());
        assert_eq!(report.stopped, SubsystemKind::SHUTDOWN_ORDER.to_vec());
        assert_eq!(engine.platform().stopped(), SubsystemKind::SHUTDOWN_ORDER.to_vec());
        assert_eq!(engine.state(), EngineState::Shutdown);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_shutdown_collects_teardown_failures() {
        let platform = HeadlessPlatform::new()
            .fail_shutdown(SubsystemKind::World)
            .fail_shutdown(SubsystemKind::Window);
        let mut engine = Engine::new(EngineConfig::minimal(), platform);
        engine.initialize().unwrap();
        let report = engine.shutdown().unwrap();

        let failed: Vec<SubsystemKind> = report.failures.iter().map(|(k, _)| *k).collect();
        assert_eq!(failed, vec![SubsystemKind::World, SubsystemKind::Window]);
        assert_eq!(report.stopped.last(), Some(&SubsystemKind::Core));
        assert_eq!(engine.state(), EngineState::Shutdown);
    }

    #[test]
    fn test_shutdown_when_not_initialized_has_no_effect() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        assert!(matches!(engine.shutdown(), Err(EngineError::NotInitialized)));
        assert!(engine.platform().calls().is_empty());

        engine.initialize().unwrap();
        engine.shutdown().unwrap();
        let calls = engine.platform().calls().len();
        assert!(matches!(engine.shutdown(), Err(EngineError::NotInitialized)));
        assert_eq!(engine.platform().calls().len(), calls);
    }

    #[test]
    fn test_initialize_twice_and_after_shutdown() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();
        assert!(matches!(engine.initialize(), Err(EngineError::AlreadyInitialized)));
        engine.shutdown().unwrap();
        assert!(matches!(engine.initialize(), Err(EngineError::AlreadyShutDown)));
    }

    #[test]
    fn test_failed_initialize_can_be_retried() {
        let platform = HeadlessPlatform::new().fail_init(SubsystemKind::Renderer);
        let mut engine = Engine::new(EngineConfig::minimal(), platform);
        assert!(engine.initialize().is_err());
        assert!(matches!(engine.shutdown(), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_pause_and_exit_request() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();

        engine.set_paused(true);
        assert!(engine.is_paused());
        assert_eq!(engine.state(), EngineState::Paused);
        engine.set_paused(false);
        assert_eq!(engine.state(), EngineState::Running);

        let handle = engine.exit_handle();
        std::thread::spawn(move || handle.request_exit()).join().unwrap();
        assert!(!engine.is_running());
        assert!(engine.is_initialized());
    }

    #[test]
    fn test_uptime_is_zero_until_running() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        assert_eq!(engine.uptime(), 0.0);
        engine.initialize().unwrap();
        assert!(engine.uptime() >= 0.0);
        engine.shutdown().unwrap();
        assert_eq!(engine.uptime(), 0.0);
    }

    #[test]
    fn test_hot_update_defers_restart_fields() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();

        let mut next = engine.config().clone();
        next.window.width = 1024;
        next.window.title = "Renamed".to_string();
        next.target_fps = 30;
        engine.update_config(next).unwrap();

        assert_eq!(engine.config().window.width, 800);
        assert_eq!(engine.config().window.title, "Renamed");
        assert_eq!(engine.config().target_fps, 30);
        assert!(engine.platform().calls().contains(&PlatformCall::ApplyConfig));
    }

    #[test]
    fn test_update_config_rejects_invalid() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        let mut bad = EngineConfig::minimal();
        bad.window.height = 0;
        assert!(matches!(
            engine.update_config(bad),
            Err(EngineError::InvalidConfiguration(_))
        ));
        assert_eq!(engine.config().window.height, 600);
    }

    #[test]
    fn test_update_config_rejects_invalid_merge() {
        let mut engine = Engine::new(online_config(), HeadlessPlatform::new());
        engine.initialize().unwrap();

        // valid alone, but the running mode is kept and needs max_players >= 1
        let mut next = engine.config().clone();
        next.network.mode = NetworkMode::Offline;
        next.network.max_players = 0;
        next.window.title = "Renamed".to_string();

        assert!(matches!(
            engine.update_config(next),
            Err(EngineError::InvalidConfiguration(_))
        ));
        assert_eq!(engine.config().network.mode, NetworkMode::P2pHost);
        assert_eq!(engine.config().network.max_players, 4);
        assert_ne!(engine.config().window.title, "Renamed");
        assert!(engine.config().validate().is_ok());
        assert!(!engine.platform().calls().contains(&PlatformCall::ApplyConfig));
    }

    #[test]
    fn test_update_before_initialize_replaces_everything() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        let mut next = EngineConfig::minimal();
        next.window.width = 1024;
        engine.update_config(next).unwrap();
        assert_eq!(engine.config().window.width, 1024);
        assert!(engine.platform().calls().is_empty());
    }

    #[test]
    fn test_reload_config_from_file() {
        let path = std::env::temp_dir().join("ashborn_engine_reload_test.toml");
        let mut on_disk = EngineConfig::minimal();
        on_disk.enable_debug_ui = false;
        on_disk.save(&path).unwrap();

        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();
        engine.reload_config(&path).unwrap();
        assert!(!engine.config().enable_debug_ui);

        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            engine.reload_config(&path),
            Err(EngineError::InvalidConfiguration(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn test_reloads_need_initialization() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        assert!(matches!(engine.reload_shaders(), Err(EngineError::NotInitialized)));
        assert!(matches!(engine.reload_assets(), Err(EngineError::NotInitialized)));

        engine.initialize().unwrap();
        engine.reload_shaders().unwrap();
        engine.reload_assets().unwrap();
        let calls = engine.platform().calls();
        assert!(calls.contains(&PlatformCall::ReloadShaders));
        assert!(calls.contains(&PlatformCall::ReloadAssets));
    }

    #[test]
    fn test_stats_merge_platform_counters_and_frame_metrics() {
        let counters = EngineStats {
            chunks_loaded: 9,
            ping_ms: 40,
            ..EngineStats::default()
        };
        let platform = HeadlessPlatform::new().with_counters(counters);
        let mut engine = Engine::new(EngineConfig::minimal(), platform);
        engine.initialize().unwrap();
        engine.record_frame(FrameMetrics {
            fps: 60.0,
            frame_time_ms: 16.7,
            update_time_ms: 1.0,
            render_time_ms: 3.0,
        });

        let stats = engine.stats();
        assert_eq!(stats.chunks_loaded, 9);
        assert_eq!(stats.ping_ms, 40);
        assert_eq!(stats.fps, 60.0);
    }

    #[test]
    fn test_drop_shuts_down() {
        let mut engine = Engine::new(EngineConfig::minimal(), HeadlessPlatform::new());
        engine.initialize().unwrap();
        let handle = engine.exit_handle();
        drop(engine);
        assert!(!handle.is_running());
    }
}
