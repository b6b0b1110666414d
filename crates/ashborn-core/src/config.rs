//! Engine configuration bundle, validation, presets, and TOML persistence
//!
//! The bundle is built once before the engine is constructed. Every group
//! deserializes with `#[serde(default)]`, so a config file only needs the
//! fields it wants to override.

use crate::error::{AssetError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    pub resizable: bool,
    /// -1 for windowed, 0+ for a specific monitor
    pub monitor_index: i32,
    /// 1, 2, 4 or 8
    pub msaa_samples: u32,
    pub borderless: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "AshBorn".to_string(),
            width: 1920,
            height: 1080,
            fullscreen: false,
            vsync: true,
            resizable: true,
            monitor_index: 0,
            msaa_samples: 1,
            borderless: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub enable_validation: bool,
    pub enable_mesh_shaders: bool,
    pub enable_raytracing: bool,
    pub enable_bindless: bool,
    pub required_extensions: Vec<String>,
    pub optional_extensions: Vec<String>,
    pub max_frames_in_flight: u32,
    /// Bytes of VRAM the renderer may use; 0 = auto detect
    pub vram_budget: u64,
    pub prefer_discrete_gpu: bool,
    pub shader_cache_path: PathBuf,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: true,
            enable_mesh_shaders: true,
            enable_raytracing: false,
            enable_bindless: true,
            required_extensions: Vec::new(),
            optional_extensions: Vec::new(),
            max_frames_in_flight: 2,
            vram_budget: 0,
            prefer_discrete_gpu: true,
            shader_cache_path: PathBuf::from("Cache/Shaders"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub raw_mouse_input: bool,
    pub mouse_sensitivity: f32,
    pub controller_deadzone: f32,
    pub enable_haptics: bool,
    pub keybind_config: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            raw_mouse_input: true,
            mouse_sensitivity: 1.0,
            controller_deadzone: 0.15,
            enable_haptics: true,
            keybind_config: PathBuf::from("Config/keybinds.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub channels: u8,
    pub master_volume: f32,
    pub enable_3d_audio: bool,
    pub max_simultaneous_sounds: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 512,
            channels: 2,
            master_volume: 1.0,
            enable_3d_audio: true,
            max_simultaneous_sounds: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Must be a non-zero power of two
    pub chunk_size: u32,
    /// In chunks
    pub render_distance: u32,
    pub simulation_distance: u32,
    pub enable_lod: bool,
    /// Generation limit per frame
    pub max_chunks_per_frame: u32,
    /// 0 = random
    pub world_seed: u64,
    pub world_save_path: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            render_distance: 16,
            simulation_distance: 8,
            enable_lod: true,
            max_chunks_per_frame: 4,
            world_seed: 0,
            world_save_path: PathBuf::from("Saves/World"),
        }
    }
}

/// How the network subsystem participates in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    #[default]
    Offline,
    P2pHost,
    P2pClient,
    DedicatedServer,
    DedicatedClient,
}

impl NetworkMode {
    pub fn is_offline(self) -> bool {
        self == NetworkMode::Offline
    }

    pub fn name(self) -> &'static str {
        match self {
            NetworkMode::Offline => "offline",
            NetworkMode::P2pHost => "p2p_host",
            NetworkMode::P2pClient => "p2p_client",
            NetworkMode::DedicatedServer => "dedicated_server",
            NetworkMode::DedicatedClient => "dedicated_client",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: NetworkMode,
    pub port: u16,
    pub server_address: String,
    pub max_players: u32,
    pub use_steam_relay: bool,
    /// Server tick rate
    pub tick_rate: u32,
    /// Client send rate
    pub send_rate: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::Offline,
            port: 7777,
            server_address: "127.0.0.1".to_string(),
            max_players: 4,
            use_steam_relay: true,
            tick_rate: 60,
            send_rate: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub asset_paths: Vec<PathBuf>,
    pub enable_hot_reload: bool,
    pub validate_assets: bool,
    pub cache_size_mb: u64,
    pub async_loading: bool,
    pub loader_threads: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_paths: vec![PathBuf::from("Content")],
            enable_hot_reload: true,
            validate_assets: true,
            cache_size_mb: 512,
            async_loading: true,
            loader_threads: 4,
        }
    }
}

/// Log output settings. The directory comes from [`EngineConfig::log_path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive string, e.g. `"info"` or `"ashborn_runtime=debug,warn"`
    pub level: String,
    pub to_file: bool,
    pub file_name: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: false,
            file_name: "ashborn.log".to_string(),
            ansi: true,
        }
    }
}

/// The complete, validated-before-use settings bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enable_profiling: bool,
    pub enable_debug_ui: bool,
    pub log_path: PathBuf,
    /// 0 = unlimited
    pub target_fps: u32,

    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub input: InputConfig,
    pub audio: AudioConfig,
    pub world: WorldConfig,
    pub network: NetworkConfig,
    pub assets: AssetConfig,
    pub logging: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_profiling: true,
            enable_debug_ui: true,
            log_path: PathBuf::from("Logs"),
            target_fps: 0,
            window: WindowConfig::default(),
            renderer: RendererConfig::default(),
            input: InputConfig::default(),
            audio: AudioConfig::default(),
            world: WorldConfig::default(),
            network: NetworkConfig::default(),
            assets: AssetConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Outcome of merging a new configuration into a running engine's.
#[derive(Debug, Clone, PartialEq)]
pub struct HotUpdate {
    /// The configuration to run with from now on
    pub config: EngineConfig,
    /// Dotted paths of changed fields that kept their old value until restart
    pub deferred: Vec<&'static str>,
}

impl EngineConfig {
    /// Defaults tuned to the host: loader threads = min(cpus / 2, 4).
    pub fn detected() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(2);
        let mut config = Self::default();
        config.assets.loader_threads = (cpus / 2).min(4);
        config
    }

    /// Small footprint for tools and tests.
    pub fn minimal() -> Self {
        let mut config = Self::default();
        config.window.width = 800;
        config.window.height = 600;
        config.renderer.enable_validation = false;
        config.renderer.enable_mesh_shaders = false;
        config.world.render_distance = 4;
        config.assets.async_loading = false;
        config.network.mode = NetworkMode::Offline;
        config
    }

    /// Everything enabled.
    pub fn maximal() -> Self {
        let mut config = Self::default();
        config.window.width = 3840;
        config.window.height = 2160;
        config.renderer.enable_validation = true;
        config.renderer.enable_mesh_shaders = true;
        config.renderer.enable_raytracing = true;
        config.renderer.enable_bindless = true;
        config.world.render_distance = 32;
        config.assets.cache_size_mb = 2048;
        config
    }

    /// Check structural invariants. Fails on the first violation and has no side effects.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = &self.window;
        if window.width == 0 || window.height == 0 {
            return Err(ConfigError::InvalidWindowDimensions {
                width: window.width,
                height: window.height,
            });
        }
        if window.title.trim().is_empty() {
            return Err(ConfigError::EmptyTitle);
        }
        if !matches!(window.msaa_samples, 1 | 2 | 4 | 8) {
            return Err(ConfigError::InvalidMsaaSamples(window.msaa_samples));
        }

        if self.renderer.max_frames_in_flight == 0 {
            return Err(ConfigError::InvalidFramesInFlight);
        }

        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(ConfigError::InvalidAudio("sample_rate must be positive"));
        }
        if audio.buffer_size == 0 {
            return Err(ConfigError::InvalidAudio("buffer_size must be positive"));
        }
        if audio.channels == 0 {
            return Err(ConfigError::InvalidAudio("channels must be positive"));
        }
        if !(0.0..=1.0).contains(&audio.master_volume) {
            return Err(ConfigError::InvalidVolume(audio.master_volume));
        }

        if !self.world.chunk_size.is_power_of_two() {
            return Err(ConfigError::InvalidChunkSize(self.world.chunk_size));
        }

        let network = &self.network;
        if !network.mode.is_offline() {
            if network.port == 0 {
                return Err(ConfigError::InvalidNetwork("port must be non-zero"));
            }
            if network.max_players == 0 {
                return Err(ConfigError::InvalidNetwork("max_players must be at least 1"));
            }
            if network.tick_rate == 0 || network.send_rate == 0 {
                return Err(ConfigError::InvalidNetwork(
                    "tick_rate and send_rate must be positive",
                ));
            }
        }

        Ok(())
    }

    /// Fields that differ between `self` and `new` and can only take effect after a restart.
    pub fn restart_required(&self, new: &EngineConfig) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.renderer != new.renderer {
            fields.push("renderer");
        }
        if self.window.width != new.window.width || self.window.height != new.window.height {
            fields.push("window.size");
        }
        if self.window.fullscreen != new.window.fullscreen {
            fields.push("window.fullscreen");
        }
        if self.window.monitor_index != new.window.monitor_index {
            fields.push("window.monitor_index");
        }
        if self.window.msaa_samples != new.window.msaa_samples {
            fields.push("window.msaa_samples");
        }
        if self.audio.sample_rate != new.audio.sample_rate
            || self.audio.channels != new.audio.channels
            || self.audio.buffer_size != new.audio.buffer_size
        {
            fields.push("audio.device");
        }
        if self.world.chunk_size != new.world.chunk_size {
            fields.push("world.chunk_size");
        }
        if self.world.world_seed != new.world.world_seed {
            fields.push("world.world_seed");
        }
        if self.network.mode != new.network.mode {
            fields.push("network.mode");
        }
        if self.network.port != new.network.port {
            fields.push("network.port");
        }
        fields
    }

    /// Merge `new` into a running configuration.
    ///
    /// Hot-swappable fields take the new value. Fields that need a restart keep
    /// their current value and are listed in [`HotUpdate::deferred`].
    pub fn hot_update(&self, new: &EngineConfig) -> HotUpdate {
        let deferred = self.restart_required(new);
        let mut config = new.clone();

        config.renderer = self.renderer.clone();
        config.window.width = self.window.width;
        config.window.height = self.window.height;
        config.window.fullscreen = self.window.fullscreen;
        config.window.monitor_index = self.window.monitor_index;
        config.window.msaa_samples = self.window.msaa_samples;
        config.audio.sample_rate = self.audio.sample_rate;
        config.audio.channels = self.audio.channels;
        config.audio.buffer_size = self.audio.buffer_size;
        config.world.chunk_size = self.world.chunk_size;
        config.world.world_seed = self.world.world_seed;
        config.network.mode = self.network.mode;
        config.network.port = self.network.port;

        HotUpdate { config, deferred }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a configuration file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::error!(path = %path.display(), "config file not found");
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Write the configuration to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!(path = %path.display(), "config saved");
        Ok(())
    }
}

/// Every configured asset root must exist when asset validation is on.
pub fn validate_asset_paths(assets: &AssetConfig) -> Result<(), AssetError> {
    if !assets.validate_assets {
        return Ok(());
    }
    for path in &assets.asset_paths {
        if !path.exists() {
            tracing::error!(path = %path.display(), "asset path not found");
            return Err(AssetError::PathNotFound(path.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::minimal().validate().is_ok());
        assert!(EngineConfig::maximal().validate().is_ok());
        assert!(EngineConfig::detected().validate().is_ok());
    }

    #[test]
    fn test_zero_window_dimension_rejected() {
        let mut config = EngineConfig::default();
        config.window.height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindowDimensions { width: 1920, height: 0 })
        ));
    }

    #[test]
    fn test_chunk_size_must_be_power_of_two() {
        let mut config = EngineConfig::default();
        for bad in [0, 3, 24, 100] {
            config.world.chunk_size = bad;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidChunkSize(n)) if n == bad
            ));
        }
        for good in [1, 16, 64] {
            config.world.chunk_size = good;
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_msaa_and_volume_rules() {
        let mut config = EngineConfig::default();
        config.window.msaa_samples = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMsaaSamples(3))
        ));

        let mut config = EngineConfig::default();
        config.audio.master_volume = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidVolume(_))));
    }

    #[test]
    fn test_online_mode_requires_port() {
        let mut config = EngineConfig::default();
        config.network.port = 0;
        assert!(config.validate().is_ok(), "offline ignores the port");

        config.network.mode = NetworkMode::P2pHost;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNetwork(_))
        ));
    }

    #[test]
    fn test_presets() {
        let minimal = EngineConfig::minimal();
        assert_eq!((minimal.window.width, minimal.window.height), (800, 600));
        assert!(!minimal.renderer.enable_validation);
        assert!(minimal.network.mode.is_offline());

        let maximal = EngineConfig::maximal();
        assert!(maximal.renderer.enable_raytracing);
        assert_eq!(maximal.assets.cache_size_mb, 2048);

        let detected = EngineConfig::detected();
        assert!(detected.assets.loader_threads <= 4);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            target_fps = 144

            [window]
            title = "Test"

            [network]
            mode = "dedicated_client"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_fps, 144);
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.network.mode, NetworkMode::DedicatedClient);
        assert_eq!(config.world.chunk_size, 32);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = EngineConfig::from_toml_str("[window\nwidth = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("ashborn_config_test");
        let path = dir.join("nested").join("engine.toml");

        let mut config = EngineConfig::maximal();
        config.window.title = "Saved".into();
        config.network.mode = NetworkMode::P2pClient;
        config.save(&path).expect("save failed");

        let loaded = EngineConfig::load(&path).expect("load failed");
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("ashborn_definitely_missing.toml");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_restart_required_lists_device_fields() {
        let old = EngineConfig::default();
        let mut new = old.clone();
        new.target_fps = 30;
        new.window.title = "Renamed".into();
        assert!(old.restart_required(&new).is_empty());

        new.renderer.enable_raytracing = true;
        new.world.chunk_size = 64;
        new.network.mode = NetworkMode::P2pHost;
        assert_eq!(
            old.restart_required(&new),
            vec!["renderer", "world.chunk_size", "network.mode"]
        );
    }

    #[test]
    fn test_hot_update_keeps_restart_fields() {
        let old = EngineConfig::default();
        let mut new = old.clone();
        new.target_fps = 60;
        new.audio.master_volume = 0.5;
        new.renderer.enable_mesh_shaders = false;
        new.window.width = 640;

        let update = old.hot_update(&new);
        assert_eq!(update.config.target_fps, 60);
        assert_eq!(update.config.audio.master_volume, 0.5);
        assert!(update.config.renderer.enable_mesh_shaders);
        assert_eq!(update.config.window.width, 1920);
        assert_eq!(update.deferred, vec!["renderer", "window.size"]);
    }

    #[test]
    fn test_asset_path_validation() {
        let dir = std::env::temp_dir().join("ashborn_asset_root_test");
        let _ = std::fs::create_dir_all(&dir);

        let mut assets = AssetConfig {
            asset_paths: vec![dir.clone()],
            ..AssetConfig::default()
        };
        assert!(validate_asset_paths(&assets).is_ok());

        let missing = dir.join("missing");
        assets.asset_paths.push(missing.clone());
        assert_eq!(
            validate_asset_paths(&assets),
            Err(AssetError::PathNotFound(missing))
        );

        assets.validate_assets = false;
        assert!(validate_asset_paths(&assets).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
