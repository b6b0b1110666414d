//! Scoped logging context
//!
//! [`Logging`] installs a console layer, and optionally a file layer, as the
//! default subscriber for the current thread. The previous subscriber comes
//! back when the value is dropped; nothing is installed process-wide.

use ashborn_core::EngineConfig;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Could not create log file {}: {source}", .path.display())]
    FileCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the installed subscriber for as long as it lives.
pub struct Logging {
    _guard: DefaultGuard,
    file: Option<PathBuf>,
}

impl std::fmt::Debug for Logging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging").field("file", &self.file).finish()
    }
}

impl Logging {
    /// Install logging as configured by `config.logging`.
    ///
    /// `RUST_LOG` overrides the configured level when set. File output goes
    /// to `<log_path>/<file_name>`, without ANSI colors.
    pub fn init(config: &EngineConfig) -> Result<Self, LogError> {
        let directive = &config.logging.level;
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(directive).map_err(|err| LogError::InvalidFilter {
                directive: directive.clone(),
                reason: err.to_string(),
            })?,
        };

        let console = fmt::layer()
            .with_target(true)
            .with_ansi(config.logging.ansi);

        let (file_layer, file) = if config.logging.to_file {
            let path = config.log_path.join(&config.logging.file_name);
            let file = open_log_file(&path)?;
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        } else {
            (None, None)
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        if let Some(path) = &file {
            tracing::info!(path = %path.display(), "file logging enabled");
        }

        Ok(Self {
            _guard: guard,
            file,
        })
    }

    /// Path of the log file, when file output is on.
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }
}

fn open_log_file(path: &Path) -> Result<File, LogError> {
    let created = |source| LogError::FileCreationFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(created)?;
    }
    File::create(path).map_err(created)
}
