//! OS windowing primitives the embedding core relies on.
//!
//! [`crate::win32_utils::Win32WindowSystem`] is the real implementation; the
//! integration tests drive the core through an in-memory shell.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::geometry::{DevicePoint, DeviceRect};

/// Opaque native window reference. Never owned by this crate unless it was
/// returned from [`WindowSystem::create_child_surface`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Answer to a non-client hit-test query on the embedded surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTest {
    /// Normal client-area hit; the surface receives the input.
    Client,
    /// Input falls through to whatever is below (`HTTRANSPARENT`).
    Transparent,
}

/// Called with the screen-space point of each hit-test query.
pub type HitTestHook = Rc<dyn Fn(DevicePoint) -> HitTest>;

pub trait WindowSystem {
    /// First top-level window of `class`.
    fn find_window(&self, class: &str) -> Option<WindowHandle>;

    /// First direct child of `parent` with `class`.
    fn find_child(&self, parent: WindowHandle, class: &str) -> Option<WindowHandle>;

    /// Snapshot of all top-level windows in z-order.
    fn top_level_windows(&self) -> Vec<WindowHandle>;

    fn class_name(&self, window: WindowHandle) -> Option<String>;

    /// Sends `msg` and waits at most `timeout` for it to be processed.
    fn send_message_timeout(
        &self,
        window: WindowHandle,
        msg: u32,
        wparam: usize,
        lparam: isize,
        timeout: Duration,
    ) -> anyhow::Result<usize>;

    /// Screen-space bounds of `window`.
    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect>;

    /// Work area of the monitor nearest to `point`.
    fn monitor_work_area(&self, point: DevicePoint) -> Option<DeviceRect>;

    /// Creates a visible child window of `parent` at `rect` (parent client coordinates).
    fn create_child_surface(&self, parent: WindowHandle, rect: DeviceRect) -> anyhow::Result<WindowHandle>;

    fn destroy_surface(&self, surface: WindowHandle) -> anyhow::Result<()>;

    /// Moves `surface` to the bottom of its parent's z-order without activating it.
    fn move_to_bottom(&self, surface: WindowHandle) -> anyhow::Result<()>;

    /// Installs (`Some`) or removes (`None`) the hit-test hook of a surface
    /// created by [`WindowSystem::create_child_surface`].
    fn set_hit_test_hook(&self, surface: WindowHandle, hook: Option<HitTestHook>) -> anyhow::Result<()>;

    /// Blocking wait used between locator retries.
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
