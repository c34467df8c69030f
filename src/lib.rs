//! Embeds an application window into the Windows desktop layer.
//!
//! - Locates the shell's desktop host window (spawning the helper window when needed)
//! - Re-anchors the window's geometry into the host's coordinate space, DPI-aware
//! - Attaches the window's content to a child surface of the host, with rollback
//! - Lets clicks outside a clickable region fall through to the desktop icons
//! - Restores the window exactly when detaching, even after partial failures
//!
//! Everything except `win32_utils` is platform-neutral and talks to the OS
//! through the [`WindowSystem`] and [`EmbedContent`] traits.

pub mod constants;

pub mod click_through;
pub mod config;
pub mod content;
pub mod coordinate_mapper;
pub mod embed_host;
pub mod embedder;
pub mod error;
pub mod geometry;
pub mod locator;
pub mod reminder;
pub mod settings;
pub mod state_machine;
pub mod window_system;

#[cfg(windows)]
mod app_state;
#[cfg(windows)]
pub mod win32_utils;

use std::sync::Once;

use env_logger::{Builder, Env};

pub use click_through::{ClickThroughRouter, ClickableRegion, HitTestRoot};
pub use config::EmbedConfig;
pub use content::{EmbedContent, RenderMode};
pub use coordinate_mapper::PlacementPercent;
pub use embed_host::{EmbedHost, EmbedSession};
pub use embedder::DesktopEmbedder;
pub use error::{AttachStep, DetachStep, EmbedError};
pub use geometry::{DevicePoint, DeviceRect, DpiScale, Geometry, LogicalPoint, LogicalRect, LogicalSize};
pub use locator::{HostKind, WindowHierarchyLocator};
pub use reminder::{NotificationSink, Reminder, ReminderScanner, ReminderSource};
pub use settings::{EmbedSettings, JsonSettingsStore, SettingsStore};
pub use state_machine::{EmbedState, EmbedStateMachine};
pub use window_system::{HitTest, HitTestHook, WindowHandle, WindowSystem};

// Embedding can be torn down and set up again within one process, and the host
// application may already have installed a logger.
static LOGGER_INIT: Once = Once::new();

/// Installs `env_logger` once, defaulting to `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    LOGGER_INIT.call_once(|| {
        let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
    });
}
