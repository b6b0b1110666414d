//! Ashborn Player - Standalone engine host binary
//!
//! Runs the engine loop in a native window, or headless for servers and smoke tests.
//!
//! Usage:
//!   ashborn-player [--config <file>] [--preset minimal] [--headless] [--frames N]

use anyhow::{Context, Result};
use ashborn_core::EngineConfig;
use ashborn_player::DesktopPlatform;
use ashborn_runtime::{run_application, Callbacks, HeadlessPlatform, Platform};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Default,
    Minimal,
    Maximal,
}

impl Preset {
    fn config(self) -> EngineConfig {
        match self {
            Preset::Default => EngineConfig::detected(),
            Preset::Minimal => EngineConfig::minimal(),
            Preset::Maximal => EngineConfig::maximal(),
        }
    }
}

#[derive(Parser)]
#[command(name = "ashborn-player")]
#[command(about = "Ashborn engine player - run the engine loop in a window or headless")]
struct Args {
    /// Path to an engine config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in config to use when no file is given
    #[arg(long, value_enum, default_value = "default")]
    preset: Preset,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Override the target frame rate (0 = unlimited)
    #[arg(long)]
    target_fps: Option<u32>,

    /// Write the resolved config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => args.preset.config(),
    };
    if let Some(fps) = args.target_fps {
        config.target_fps = fps;
    }

    if let Some(path) = &args.write_config {
        config.save(path).context("Failed to write config")?;
        println!("Wrote config to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let platform: Box<dyn Platform> = match (args.headless, args.frames) {
        (true, Some(frames)) => Box::new(HeadlessPlatform::new().close_after(frames)),
        (true, None) => Box::new(HeadlessPlatform::new()),
        (false, Some(frames)) => Box::new(DesktopPlatform::new().close_after(frames)),
        (false, None) => Box::new(DesktopPlatform::new()),
    };

    if !args.headless {
        println!("Controls:");
        println!("  Escape   - Exit");
    }

    let callbacks = Callbacks::new()
        .on_start(|| tracing::info!("session started"))
        .on_resize(|width, height| tracing::debug!(width, height, "viewport resized"))
        .on_focus_changed(|focused| tracing::debug!(focused, "focus changed"))
        .on_shutdown(|| tracing::info!("session ended"));

    let code = run_application(config, callbacks, platform);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
