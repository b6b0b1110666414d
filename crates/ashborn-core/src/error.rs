//! Error types for Ashborn

use crate::SubsystemKind;
use std::path::PathBuf;
use thiserror::Error;

/// A structural invariant of the configuration bundle was violated,
/// or the bundle could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid window dimensions: {width}x{height}")]
    InvalidWindowDimensions { width: u32, height: u32 },

    #[error("Window title must not be empty")]
    EmptyTitle,

    #[error("MSAA sample count must be 1, 2, 4 or 8, got {0}")]
    InvalidMsaaSamples(u32),

    #[error("Chunk size must be a non-zero power of two, got {0}")]
    InvalidChunkSize(u32),

    #[error("Renderer needs at least one frame in flight")]
    InvalidFramesInFlight,

    #[error("Invalid audio setting: {0}")]
    InvalidAudio(&'static str),

    #[error("Master volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),

    #[error("Invalid network setting: {0}")]
    InvalidNetwork(&'static str),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("TOML serialization error: {0}")]
    Serialize(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Allocator setup failed")]
    AllocatorFailed,
    #[error("Performance counters unavailable")]
    CountersUnavailable,
    #[error("Core failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Windowing backend failed to initialize: {0}")]
    BackendInitFailed(String),
    #[error("Window creation failed: {0}")]
    WindowCreationFailed(String),
    #[error("Monitor {0} not found")]
    MonitorNotFound(i32),
    #[error("Invalid window dimensions")]
    InvalidDimensions,
    #[error("Surface creation failed")]
    SurfaceCreationFailed,
    #[error("Window failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("Graphics API initialization failed: {0}")]
    ApiInitFailed(String),
    #[error("No suitable GPU found")]
    NoSuitableGpu,
    #[error("Swapchain creation failed")]
    SwapchainCreationFailed,
    #[error("Validation layers unavailable")]
    ValidationLayersUnavailable,
    #[error("Extension not supported: {0}")]
    ExtensionNotSupported(String),
    #[error("Shader compilation failed: {0}")]
    ShaderCompilationFailed(String),
    #[error("Out of GPU memory")]
    OutOfGpuMemory,
    #[error("No presentation surface")]
    NoSurface,
    #[error("Renderer failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Input initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Input device not found")]
    DeviceNotFound,
    #[error("Key mapping failed: {0}")]
    MappingFailed(String),
    #[error("Input failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Audio device initialization failed: {0}")]
    DeviceInitFailed(String),
    #[error("No audio output device")]
    NoOutputDevice,
    #[error("Audio format not supported")]
    FormatNotSupported,
    #[error("Audio buffer creation failed")]
    BufferCreationFailed,
    #[error("Audio failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("World initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Invalid world configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Chunk generation failed")]
    ChunkGenerationFailed,
    #[error("World serialization failed: {0}")]
    SerializationFailed(String),
    #[error("World failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Network initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Failed to bind port {0}")]
    PortBindFailed(u16),
    #[error("Relay service unavailable")]
    RelayUnavailable,
    #[error("Connection to {0} failed")]
    ConnectionFailed(String),
    #[error("Network failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Asset system initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Asset path not found: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("No loader registered for {0}")]
    LoaderNotFound(String),
    #[error("Corrupted asset: {0}")]
    CorruptedAsset(String),
    #[error("Asset failure: {0}")]
    Other(String),
}

/// Any subsystem-specific error, kept intact for logging before it is
/// folded into [`EngineError::SubsystemFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubsystemError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Errors reported at the orchestrator boundary
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine is already initialized")]
    AlreadyInitialized,

    #[error("Engine is not initialized")]
    NotInitialized,

    #[error("Engine has been shut down; construct a new engine to start again")]
    AlreadyShutDown,

    #[error("Subsystem '{subsystem}' failed: {source}")]
    SubsystemFailure {
        subsystem: SubsystemKind,
        #[source]
        source: SubsystemError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

impl EngineError {
    pub fn subsystem(subsystem: SubsystemKind, source: impl Into<SubsystemError>) -> Self {
        EngineError::SubsystemFailure {
            subsystem,
            source: source.into(),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
