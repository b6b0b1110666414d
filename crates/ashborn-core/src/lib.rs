//! Ashborn Core - Foundational types for the Ashborn engine
//!
//! This crate provides the types the runtime is built on:
//! - `EngineConfig` - The per-run settings bundle, its validation and TOML persistence
//! - `SubsystemKind` - The closed, ordered set of engine subsystems
//! - Error types and Result alias

pub mod config;
mod error;
mod subsystem;

pub use config::{
    validate_asset_paths, AssetConfig, AudioConfig, EngineConfig, HotUpdate, InputConfig,
    LogConfig, NetworkConfig, NetworkMode, RendererConfig, WindowConfig, WorldConfig,
};
pub use error::{
    AssetError, AudioError, ConfigError, CoreError, EngineError, InputError, NetworkError,
    RendererError, Result, SubsystemError, WindowError, WorldError,
};
pub use subsystem::SubsystemKind;
