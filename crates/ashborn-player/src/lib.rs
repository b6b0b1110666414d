//! Ashborn Player - standalone engine host
//!
//! Provides the `DesktopPlatform` that backs the engine with a native window.

mod desktop;

pub use desktop::DesktopPlatform;
