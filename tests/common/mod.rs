//! In-memory desktop shell and application window for driving the embedder
//! without Win32.

#![allow(dead_code)]

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::time::Duration;

use anyhow::bail;
use desktop_embed::constants::{DESKTOP_MANAGER_CLASS, HELPER_WINDOW_CLASS, ICON_VIEW_CLASS, WM_SPAWN_WORKER};
use desktop_embed::{
    DevicePoint, DeviceRect, DpiScale, EmbedContent, HitTestHook, LogicalRect, LogicalSize, RenderMode,
    WindowHandle, WindowSystem,
};

/// Monitor the tests place windows on. The host spans the virtual desktop
/// starting one 1920 px monitor to the left.
pub const WORK_AREA: DeviceRect = DeviceRect { x: 0, y: 0, width: 1920, height: 1040 };
pub const HOST_RECT: DeviceRect = DeviceRect { x: -1920, y: 0, width: 3840, height: 1080 };

#[derive(Default)]
pub struct ShellFailures {
    pub create_surface: bool,
    pub destroy_surface: bool,
    pub move_to_bottom: bool,
    pub set_hook: bool,
    pub spawn: bool,
}

pub struct Surface {
    pub handle: WindowHandle,
    pub parent: WindowHandle,
    pub rect: DeviceRect,
    pub hook: Option<HitTestHook>,
    pub at_bottom: bool,
}

/// Helper window that only shows up after some number of hierarchy scans.
pub struct DelayedHelper {
    pub on_scan: usize,
    pub with_view: bool,
}

#[derive(Default)]
pub struct ShellState {
    pub manager: Option<WindowHandle>,
    pub top_level: Vec<WindowHandle>,
    pub classes: HashMap<WindowHandle, String>,
    pub children: HashMap<WindowHandle, Vec<WindowHandle>>,
    pub rects: HashMap<WindowHandle, DeviceRect>,
    pub work_area: Option<DeviceRect>,
    pub surfaces: Vec<Surface>,
    pub destroyed: Vec<WindowHandle>,
    pub spawn_requests: Vec<(usize, isize)>,
    pub pauses: Vec<Duration>,
    pub scans: usize,
    pub delayed_helper: Option<DelayedHelper>,
    pub fail: ShellFailures,
    pub calls: usize,
    next_handle: isize,
}

impl ShellState {
    fn alloc(&mut self, class: &str) -> WindowHandle {
        self.next_handle += 0x10;
        let handle = WindowHandle(self.next_handle);
        self.classes.insert(handle, class.to_string());
        handle
    }

    pub fn surface(&self, handle: WindowHandle) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.handle == handle)
    }
}

pub struct MockShell {
    state: RefCell<ShellState>,
}

impl MockShell {
    /// `Progman` exists but nothing can host the window.
    pub fn empty() -> Self {
        let mut state = ShellState { work_area: Some(WORK_AREA), ..Default::default() };
        let manager = state.alloc(DESKTOP_MANAGER_CLASS);
        state.rects.insert(manager, HOST_RECT);
        state.top_level.push(manager);
        state.manager = Some(manager);
        Self { state: RefCell::new(state) }
    }

    /// Explorer not running.
    pub fn without_manager() -> Self {
        Self { state: RefCell::new(ShellState { work_area: Some(WORK_AREA), ..Default::default() }) }
    }

    /// The usual layout after the spawn message: a `WorkerW` holding the icon
    /// view, followed by an empty `WorkerW`.
    pub fn standard() -> Self {
        let shell = Self::empty();
        let with_view = shell.add_top_level(HELPER_WINDOW_CLASS);
        shell.add_child(with_view, ICON_VIEW_CLASS);
        shell.add_top_level(HELPER_WINDOW_CLASS);
        shell
    }

    pub fn manager(&self) -> WindowHandle {
        self.state.borrow().manager.unwrap_or(WindowHandle::NULL)
    }

    pub fn add_top_level(&self, class: &str) -> WindowHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc(class);
        state.rects.insert(handle, HOST_RECT);
        state.top_level.push(handle);
        handle
    }

    pub fn add_child(&self, parent: WindowHandle, class: &str) -> WindowHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc(class);
        state.children.entry(parent).or_default().push(handle);
        handle
    }

    pub fn state(&self) -> Ref<'_, ShellState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, ShellState> {
        self.state.borrow_mut()
    }

    /// The only live surface; panics if there is not exactly one.
    pub fn single_surface(&self) -> Ref<'_, Surface> {
        Ref::map(self.state.borrow(), |state| {
            assert_eq!(state.surfaces.len(), 1, "expected exactly one live surface");
            &state.surfaces[0]
        })
    }

    fn count(&self) {
        self.state.borrow_mut().calls += 1;
    }
}

impl WindowSystem for MockShell {
    fn find_window(&self, class: &str) -> Option<WindowHandle> {
        self.count();
        let state = self.state.borrow();
        state.top_level.iter().copied().find(|h| state.classes.get(h).map(String::as_str) == Some(class))
    }

    fn find_child(&self, parent: WindowHandle, class: &str) -> Option<WindowHandle> {
        self.count();
        let state = self.state.borrow();
        state
            .children
            .get(&parent)?
            .iter()
            .copied()
            .find(|h| state.classes.get(h).map(String::as_str) == Some(class))
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        self.count();
        let mut state = self.state.borrow_mut();
        state.scans += 1;
        let due = state.delayed_helper.as_ref().is_some_and(|d| state.scans >= d.on_scan);
        if due {
            if let Some(helper) = state.delayed_helper.take() {
                let handle = state.alloc(HELPER_WINDOW_CLASS);
                state.rects.insert(handle, HOST_RECT);
                state.top_level.push(handle);
                if helper.with_view {
                    let view = state.alloc(ICON_VIEW_CLASS);
                    state.children.entry(handle).or_default().push(view);
                }
            }
        }
        state.top_level.clone()
    }

    fn class_name(&self, window: WindowHandle) -> Option<String> {
        self.count();
        self.state.borrow().classes.get(&window).cloned()
    }

    fn send_message_timeout(
        &self,
        window: WindowHandle,
        msg: u32,
        wparam: usize,
        lparam: isize,
        _timeout: Duration,
    ) -> anyhow::Result<usize> {
        self.count();
        let mut state = self.state.borrow_mut();
        assert_eq!(Some(window), state.manager);
        assert_eq!(msg, WM_SPAWN_WORKER);
        state.spawn_requests.push((wparam, lparam));
        if state.fail.spawn {
            bail!("timed out");
        }
        Ok(0)
    }

    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        self.count();
        self.state.borrow().rects.get(&window).copied()
    }

    fn monitor_work_area(&self, _point: DevicePoint) -> Option<DeviceRect> {
        self.count();
        self.state.borrow().work_area
    }

    fn create_child_surface(&self, parent: WindowHandle, rect: DeviceRect) -> anyhow::Result<WindowHandle> {
        self.count();
        let mut state = self.state.borrow_mut();
        if state.fail.create_surface {
            bail!("CreateWindowExW failed");
        }
        let handle = state.alloc("DESKTOP_EMBED_HOST_SURFACE");
        state.surfaces.push(Surface { handle, parent, rect, hook: None, at_bottom: false });
        Ok(handle)
    }

    fn destroy_surface(&self, surface: WindowHandle) -> anyhow::Result<()> {
        self.count();
        let mut state = self.state.borrow_mut();
        if state.fail.destroy_surface {
            bail!("DestroyWindow failed");
        }
        let before = state.surfaces.len();
        state.surfaces.retain(|s| s.handle != surface);
        if state.surfaces.len() == before {
            bail!("{:?} is not a live surface", surface);
        }
        state.destroyed.push(surface);
        Ok(())
    }

    fn move_to_bottom(&self, surface: WindowHandle) -> anyhow::Result<()> {
        self.count();
        let mut state = self.state.borrow_mut();
        if state.fail.move_to_bottom {
            bail!("SetWindowPos failed");
        }
        match state.surfaces.iter_mut().find(|s| s.handle == surface) {
            Some(s) => {
                s.at_bottom = true;
                Ok(())
            }
            None => bail!("{:?} is not a live surface", surface),
        }
    }

    fn set_hit_test_hook(&self, surface: WindowHandle, hook: Option<HitTestHook>) -> anyhow::Result<()> {
        self.count();
        let mut state = self.state.borrow_mut();
        if state.fail.set_hook {
            bail!("surface state missing");
        }
        match state.surfaces.iter_mut().find(|s| s.handle == surface) {
            Some(s) => {
                s.hook = hook;
                Ok(())
            }
            None => bail!("{:?} is not a live surface", surface),
        }
    }

    fn pause(&self, duration: Duration) {
        self.state.borrow_mut().pauses.push(duration);
    }
}

#[derive(Default)]
pub struct ContentFailures {
    pub read_bounds: bool,
    pub reparent: bool,
    pub restore: bool,
    pub layout: bool,
    pub set_bounds: bool,
    pub hide: bool,
    pub show: bool,
}

/// The application window: a top-level frame plus one content view.
pub struct MockContent {
    pub bounds: LogicalRect,
    pub scale: DpiScale,
    pub render_mode: RenderMode,
    /// `None` while the content view sits in its own top-level window.
    pub parent: Option<WindowHandle>,
    pub visible: bool,
    pub layouts: Vec<LogicalSize>,
    pub invalidations: usize,
    pub fail: ContentFailures,
    ops: Cell<usize>,
}

impl MockContent {
    pub fn new(bounds: LogicalRect, scale: f64) -> Self {
        Self {
            bounds,
            scale: DpiScale::uniform(scale),
            render_mode: RenderMode::Default,
            parent: None,
            visible: true,
            layouts: Vec::new(),
            invalidations: 0,
            fail: ContentFailures::default(),
            ops: Cell::new(0),
        }
    }

    pub fn ops(&self) -> usize {
        self.ops.get()
    }

    fn count(&self) {
        self.ops.set(self.ops.get() + 1);
    }
}

impl EmbedContent for MockContent {
    fn logical_bounds(&self) -> anyhow::Result<LogicalRect> {
        self.count();
        if self.fail.read_bounds {
            bail!("GetWindowRect failed");
        }
        Ok(self.bounds)
    }

    fn set_logical_bounds(&mut self, bounds: LogicalRect) -> anyhow::Result<()> {
        self.count();
        if self.fail.set_bounds {
            bail!("SetWindowPos failed");
        }
        self.bounds = bounds;
        Ok(())
    }

    fn dpi_scale(&self) -> DpiScale {
        self.count();
        self.scale
    }

    fn render_mode(&self) -> RenderMode {
        self.count();
        self.render_mode
    }

    fn set_render_mode(&mut self, mode: RenderMode) {
        self.count();
        self.render_mode = mode;
    }

    fn reparent_content(&mut self, surface: WindowHandle) -> anyhow::Result<()> {
        self.count();
        if self.fail.reparent {
            bail!("SetParent failed");
        }
        self.parent = Some(surface);
        Ok(())
    }

    fn restore_content(&mut self) -> anyhow::Result<()> {
        self.count();
        if self.fail.restore {
            bail!("SetParent failed");
        }
        self.parent = None;
        Ok(())
    }

    fn layout(&mut self, size: LogicalSize) -> anyhow::Result<()> {
        self.count();
        if self.fail.layout {
            bail!("MoveWindow failed");
        }
        self.layouts.push(size);
        Ok(())
    }

    fn invalidate_layout(&mut self) {
        self.count();
        self.invalidations += 1;
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        self.count();
        if self.fail.hide {
            bail!("ShowWindow failed");
        }
        self.visible = false;
        Ok(())
    }

    fn show_and_activate(&mut self) -> anyhow::Result<()> {
        self.count();
        // The window comes back even if activation is refused.
        self.visible = true;
        if self.fail.show {
            bail!("SetForegroundWindow refused");
        }
        Ok(())
    }
}
