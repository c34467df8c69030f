//! Finds a window inside the Explorer desktop hierarchy that can parent our surface.
//!
//! Explorer only creates the wallpaper `WorkerW` after `Progman` receives the
//! undocumented `0x052C` message, and it does so asynchronously. The locator
//! therefore sends the message, then scans top-level windows a few times with
//! a short pause in between. If a whole round finds nothing, the message is
//! re-sent with the next parameter encoding and the scan repeats.

use std::time::Duration;

use log::{debug, info, warn};

use crate::config::EmbedConfig;
use crate::constants::{
    DESKTOP_MANAGER_CLASS, HELPER_WINDOW_CLASS, ICON_VIEW_CLASS, SPAWN_WORKER_PARAMS, WM_SPAWN_WORKER,
};
use crate::error::EmbedError;
use crate::window_system::{WindowHandle, WindowSystem};

/// Which part of the shell hierarchy the host handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// A `WorkerW` that owns the `SHELLDLL_DefView`.
    HelperWithView,
    /// The `SHELLDLL_DefView` itself, parented directly to `Progman`.
    IconView,
    /// A `WorkerW` without icons (the classic wallpaper layer).
    HelperOnly,
}

/// Result of one enumeration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyScan {
    pub helper_with_view: Option<WindowHandle>,
    pub icon_view_under_manager: Option<WindowHandle>,
    pub helper_only: Option<WindowHandle>,
}

impl HierarchyScan {
    pub fn is_empty(&self) -> bool {
        self.helper_with_view.is_none() && self.icon_view_under_manager.is_none() && self.helper_only.is_none()
    }

    /// Applies the preference order: helper with icons, bare icon view, helper without icons.
    pub fn select(&self) -> Option<(WindowHandle, HostKind)> {
        self.helper_with_view
            .map(|h| (h, HostKind::HelperWithView))
            .or_else(|| self.icon_view_under_manager.map(|h| (h, HostKind::IconView)))
            .or_else(|| self.helper_only.map(|h| (h, HostKind::HelperOnly)))
    }
}

pub struct WindowHierarchyLocator<'a, W: WindowSystem> {
    windows: &'a W,
    attempts: u32,
    backoff: Duration,
    spawn_timeout: Duration,
}

impl<'a, W: WindowSystem> WindowHierarchyLocator<'a, W> {
    pub fn new(windows: &'a W, config: &EmbedConfig) -> Self {
        Self {
            windows,
            attempts: config.retry_attempts.max(1),
            backoff: config.retry_backoff(),
            spawn_timeout: config.spawn_timeout(),
        }
    }

    pub fn locate(&self) -> Result<(WindowHandle, HostKind), EmbedError> {
        let Some(manager) = self.windows.find_window(DESKTOP_MANAGER_CLASS) else {
            warn!("[Locator] {} not found; is Explorer running?", DESKTOP_MANAGER_CLASS);
            return Err(EmbedError::HostNotFound { attempts: 0 });
        };
        info!("[Locator] {} = {:?}", DESKTOP_MANAGER_CLASS, manager);

        let mut passes = 0;
        for &(wparam, lparam) in SPAWN_WORKER_PARAMS {
            self.request_helper(manager, wparam, lparam);

            for attempt in 1..=self.attempts {
                passes += 1;
                let scan = self.scan(manager);
                if let Some((host, kind)) = scan.select() {
                    info!(
                        "[Locator] Selected {:?} {:?} (pass {}, candidates {:?})",
                        kind, host, passes, scan
                    );
                    return Ok((host, kind));
                }
                if attempt < self.attempts {
                    self.windows.pause(self.backoff);
                }
            }
            warn!(
                "[Locator] No host after {} passes with spawn params ({:#x}, {:#x})",
                self.attempts, wparam, lparam
            );
        }

        Err(EmbedError::HostNotFound { attempts: passes })
    }

    /// Best effort: the shell may ignore the message, time out, or create the
    /// helper later, so failures only get logged.
    fn request_helper(&self, manager: WindowHandle, wparam: usize, lparam: isize) {
        match self
            .windows
            .send_message_timeout(manager, WM_SPAWN_WORKER, wparam, lparam, self.spawn_timeout)
        {
            Ok(_) => debug!("[Locator] Spawn request ({:#x}, {:#x}) delivered", wparam, lparam),
            Err(e) => warn!("[Locator] Spawn request ({:#x}, {:#x}) failed: {:#}", wparam, lparam, e),
        }
    }

    /// One full pass over the top-level windows.
    pub fn scan(&self, manager: WindowHandle) -> HierarchyScan {
        let mut scan = HierarchyScan::default();

        for window in self.windows.top_level_windows() {
            if self.windows.class_name(window).as_deref() != Some(HELPER_WINDOW_CLASS) {
                continue;
            }
            if self.windows.find_child(window, ICON_VIEW_CLASS).is_some() {
                scan.helper_with_view.get_or_insert(window);
            } else {
                scan.helper_only.get_or_insert(window);
            }
        }

        scan.icon_view_under_manager = self.windows.find_child(manager, ICON_VIEW_CLASS);
        debug!("[Locator] Scan: {:?}", scan);
        scan
    }
}
