//! The closed set of engine subsystems and their start order

use std::fmt;

/// One of the engine's fixed subsystems.
///
/// The set is closed: the orchestrator brings these up in [`SubsystemKind::START_ORDER`]
/// and tears them down in [`SubsystemKind::SHUTDOWN_ORDER`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubsystemKind {
    Core,
    Window,
    Renderer,
    Input,
    Audio,
    World,
    Network,
    Assets,
}

impl SubsystemKind {
    /// Start order. Window precedes renderer (surface creation), assets come last.
    pub const START_ORDER: [SubsystemKind; 8] = [
        SubsystemKind::Core,
        SubsystemKind::Window,
        SubsystemKind::Renderer,
        SubsystemKind::Input,
        SubsystemKind::Audio,
        SubsystemKind::World,
        SubsystemKind::Network,
        SubsystemKind::Assets,
    ];

    /// Strict reverse of [`SubsystemKind::START_ORDER`].
    pub const SHUTDOWN_ORDER: [SubsystemKind; 8] = [
        SubsystemKind::Assets,
        SubsystemKind::Network,
        SubsystemKind::World,
        SubsystemKind::Audio,
        SubsystemKind::Input,
        SubsystemKind::Renderer,
        SubsystemKind::Window,
        SubsystemKind::Core,
    ];

    /// Stable lowercase name used in log records.
    pub fn name(self) -> &'static str {
        match self {
            SubsystemKind::Core => "core",
            SubsystemKind::Window => "window",
            SubsystemKind::Renderer => "renderer",
            SubsystemKind::Input => "input",
            SubsystemKind::Audio => "audio",
            SubsystemKind::World => "world",
            SubsystemKind::Network => "network",
            SubsystemKind::Assets => "assets",
        }
    }

    /// Whether an initialization failure aborts startup.
    ///
    /// Audio and network failures degrade the engine instead.
    pub fn is_critical(self) -> bool {
        !matches!(self, SubsystemKind::Audio | SubsystemKind::Network)
    }

    /// Zero-based position in the start order.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
