//! Win32 implementations of [`WindowSystem`] and [`EmbedContent`].
//!
//! The embed surface is a plain child window of our own class. The
//! application's content HWND is re-parented into it, exactly like a view
//! hosted in a normal top-level window.
//!
//! ## Handled Messages (embed surface)
//!
//! - **WM_NCHITTEST**: Ask the installed hit-test hook; `Transparent` maps to
//!   `HTTRANSPARENT` so clicks reach the desktop icons underneath.
//! - **WM_SIZE**: Resize the content child to fill the surface.
//! - **WM_NCDESTROY**: Drop the `SurfaceState`.
//! - **All others**: `DefWindowProcW`.
//!
//! The content child covers the surface, so Windows hit-tests the child, not
//! the surface. While a hook is installed the surface's children are
//! subclassed and answer `WM_NCHITTEST` through the same hook.

use std::ffi::{OsStr, c_void};
use std::os::windows::ffi::OsStrExt;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use log::{debug, error, info, warn};
use windows::{
    Win32::{
        Foundation::{BOOL, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM},
        Graphics::Gdi::{
            GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromPoint, RDW_ALLCHILDREN,
            RDW_ERASE, RDW_INVALIDATE, RedrawWindow, ScreenToClient, UpdateWindow,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            HiDpi::GetDpiForWindow,
            Input::KeyboardAndMouse::SetFocus,
            Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass},
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, EnumWindows, FindWindowExW, FindWindowW,
                GW_CHILD, GW_HWNDNEXT, GWLP_USERDATA, GetClassNameW, GetClientRect, GetParent, GetWindow,
                GetWindowLongPtrW, GetWindowRect, HWND_BOTTOM, IDC_ARROW, IsIconic, IsWindowVisible, LoadCursorW,
                MoveWindow, RegisterClassW, SMTO_NORMAL, SW_HIDE, SW_RESTORE, SW_SHOWNORMAL,
                SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SendMessageTimeoutW,
                SetForegroundWindow, SetParent, SetWindowLongPtrW, SetWindowPos, ShowWindow, WM_NCDESTROY,
                WM_NCHITTEST, WM_SIZE, WNDCLASSW, WS_CHILD, WS_CLIPCHILDREN, WS_EX_NOACTIVATE, WS_VISIBLE,
            },
        },
    },
    core::PCWSTR,
};

use crate::app_state::SurfaceState;
use crate::click_through::{ClickableRegion, HitTestRoot};
use crate::config::EmbedConfig;
use crate::constants::EMBED_SURFACE_CLASS;
use crate::content::{EmbedContent, RenderMode};
use crate::coordinate_mapper;
use crate::embedder::DesktopEmbedder;
use crate::geometry::{DevicePoint, DeviceRect, DpiScale, LogicalPoint, LogicalRect, LogicalSize};
use crate::window_system::{HitTest, HitTestHook, WindowHandle, WindowSystem};

/// `HTTRANSPARENT`; the hit-test result is a signed value.
const HT_TRANSPARENT: isize = -1;

/// Subclass id used on content windows while click-through is installed.
const CONTENT_SUBCLASS_ID: usize = 0x0E3B;

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

/// Build a null-terminated UTF-16 string for Win32 APIs.
pub fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}

fn point_from_lparam(lparam: LPARAM) -> DevicePoint {
    DevicePoint {
        x: (lparam.0 & 0xFFFF) as i16 as i32,
        y: ((lparam.0 >> 16) & 0xFFFF) as i16 as i32,
    }
}

fn rect_from_win32(rc: RECT) -> DeviceRect {
    DeviceRect::from_edges(rc.left, rc.top, rc.right, rc.bottom)
}

fn window_dpi_scale(window: HWND) -> DpiScale {
    let dpi = unsafe { GetDpiForWindow(window) };
    DpiScale::from_dpi(dpi, dpi)
}

/// Decodes `WM_DPICHANGED`: `wParam` carries the new X/Y DPI, `lParam` points
/// at the suggested window rectangle.
///
/// # Safety
/// `lparam` must come from a `WM_DPICHANGED` message being handled right now.
pub unsafe fn dpi_change_from_message(wparam: WPARAM, lparam: LPARAM) -> Option<(DeviceRect, DpiScale)> {
    let suggested = lparam.0 as *const RECT;
    if suggested.is_null() {
        return None;
    }
    let dpi_x = (wparam.0 & 0xFFFF) as u32;
    let dpi_y = ((wparam.0 >> 16) & 0xFFFF) as u32;
    let rc = unsafe { *suggested };
    Some((rect_from_win32(rc), DpiScale::from_dpi(dpi_x, dpi_y)))
}

//---------------------------------------------------------------------------
// Embed surface window procedure
//---------------------------------------------------------------------------

/// # Safety
/// Registered as `lpfnWndProc` of the embed surface class only; `GWLP_USERDATA`
/// is either null or a `*mut SurfaceState` from `create_child_surface`.
unsafe extern "system" fn surface_wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        let state_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut SurfaceState;

        match msg {
            WM_NCHITTEST => {
                if surface_hit_test(hwnd, lparam) == HitTest::Transparent {
                    return LRESULT(HT_TRANSPARENT);
                }
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }

            WM_SIZE => {
                if let Ok(child) = GetWindow(hwnd, GW_CHILD) {
                    fill_parent(child, hwnd);
                }
                LRESULT(0)
            }

            WM_NCDESTROY => {
                if !state_ptr.is_null() {
                    debug!("[Win32] Dropping SurfaceState of {:?}", hwnd);
                    SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                    drop(Box::from_raw(state_ptr));
                }
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }

            other => DefWindowProcW(hwnd, other, wparam, lparam),
        }
    }
}

/// Runs the hook installed on `surface`; `Client` when there is none.
///
/// # Safety
/// `surface` must be a window whose `GWLP_USERDATA` is null or a live
/// `*mut SurfaceState` (i.e. an embed surface).
unsafe fn surface_hit_test(surface: HWND, lparam: LPARAM) -> HitTest {
    let state = unsafe { GetWindowLongPtrW(surface, GWLP_USERDATA) } as *const SurfaceState;
    // Cloned so the hook runs without a borrow into the surface state.
    let hook = unsafe { state.as_ref() }.and_then(|state| state.hit_test.clone());
    match hook {
        Some(hook) => hook(point_from_lparam(lparam)),
        None => HitTest::Client,
    }
}

/// Subclass procedure for the surface's children; `surface` is the ref data.
/// Only acts while the child is still parented to that surface.
unsafe extern "system" fn content_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _id: usize,
    surface: usize,
) -> LRESULT {
    unsafe {
        if msg == WM_NCHITTEST {
            let surface = HWND(surface as *mut c_void);
            if GetParent(hwnd).is_ok_and(|parent| parent == surface)
                && surface_hit_test(surface, lparam) == HitTest::Transparent
            {
                return LRESULT(HT_TRANSPARENT);
            }
        }
        DefSubclassProc(hwnd, msg, wparam, lparam)
    }
}

/// Direct children of `parent`, in z-order.
fn child_windows(parent: HWND) -> Vec<HWND> {
    let mut children = Vec::new();
    let mut next = unsafe { GetWindow(parent, GW_CHILD) };
    while let Ok(child) = next {
        if child.is_invalid() {
            break;
        }
        children.push(child);
        next = unsafe { GetWindow(child, GW_HWNDNEXT) };
    }
    children
}

/// Sizes `child` to cover the client area of `parent`.
fn fill_parent(child: HWND, parent: HWND) {
    let mut rc = RECT::default();
    if unsafe { GetClientRect(parent, &mut rc) }.is_ok() {
        let w = rc.right - rc.left;
        let h = rc.bottom - rc.top;
        if let Err(e) = unsafe { MoveWindow(child, 0, 0, w, h, true) } {
            warn!("[Win32] Resizing {:?} to {}×{} failed: {}", child, w, h, e);
        }
    }
}

static SURFACE_CLASS_ATOM: OnceLock<u16> = OnceLock::new();

/// Registers the embed surface class (once).
fn register_surface_class() -> anyhow::Result<()> {
    let atom = *SURFACE_CLASS_ATOM.get_or_init(|| unsafe {
        let Ok(module) = GetModuleHandleW(None) else {
            return 0;
        };
        let class_name = to_wide(EMBED_SURFACE_CLASS);
        let wc = WNDCLASSW {
            hInstance: module.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            lpfnWndProc: Some(surface_wnd_proc),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            ..Default::default()
        };
        let atom = RegisterClassW(&wc);
        if atom == 0 {
            error!("[Win32] RegisterClassW failed: {}", windows::core::Error::from_win32());
        } else {
            info!("[Win32] Embed surface class registered");
        }
        atom
    });
    if atom == 0 {
        bail!("embed surface class {EMBED_SURFACE_CLASS} could not be registered");
    }
    Ok(())
}

//---------------------------------------------------------------------------
// WindowSystem
//---------------------------------------------------------------------------

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let found = unsafe { &mut *(lparam.0 as *mut Vec<WindowHandle>) };
    found.push(handle(hwnd));
    BOOL(1)
}

/// The real desktop. Stateless; every call goes straight to user32.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

impl WindowSystem for Win32WindowSystem {
    fn find_window(&self, class: &str) -> Option<WindowHandle> {
        let class = to_wide(class);
        unsafe { FindWindowW(PCWSTR(class.as_ptr()), PCWSTR::null()) }
            .ok()
            .filter(|h| !h.is_invalid())
            .map(handle)
    }

    fn find_child(&self, parent: WindowHandle, class: &str) -> Option<WindowHandle> {
        let class = to_wide(class);
        unsafe { FindWindowExW(Some(hwnd(parent)), None, PCWSTR(class.as_ptr()), PCWSTR::null()) }
            .ok()
            .filter(|h| !h.is_invalid())
            .map(handle)
    }

    fn top_level_windows(&self) -> Vec<WindowHandle> {
        let mut found: Vec<WindowHandle> = Vec::new();
        if let Err(e) = unsafe { EnumWindows(Some(collect_window), LPARAM(&mut found as *mut _ as isize)) } {
            warn!("[Win32] EnumWindows failed after {} windows: {}", found.len(), e);
        }
        found
    }

    fn class_name(&self, window: WindowHandle) -> Option<String> {
        let mut buf = [0u16; 256];
        let len = unsafe { GetClassNameW(hwnd(window), &mut buf) };
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..len as usize]))
    }

    fn send_message_timeout(
        &self,
        window: WindowHandle,
        msg: u32,
        wparam: usize,
        lparam: isize,
        timeout: Duration,
    ) -> anyhow::Result<usize> {
        let mut result: usize = 0;
        let ok = unsafe {
            SendMessageTimeoutW(
                hwnd(window),
                msg,
                WPARAM(wparam),
                LPARAM(lparam),
                SMTO_NORMAL,
                timeout.as_millis().min(u32::MAX as u128) as u32,
                Some(&mut result as *mut usize),
            )
        };
        if ok.0 == 0 {
            return Err(anyhow!(windows::core::Error::from_win32()))
                .with_context(|| format!("SendMessageTimeoutW({:?}, {:#x})", window, msg));
        }
        Ok(result)
    }

    fn window_rect(&self, window: WindowHandle) -> Option<DeviceRect> {
        let mut rc = RECT::default();
        match unsafe { GetWindowRect(hwnd(window), &mut rc) } {
            Ok(()) => Some(rect_from_win32(rc)),
            Err(e) => {
                debug!("[Win32] GetWindowRect({:?}) failed: {}", window, e);
                None
            }
        }
    }

    fn monitor_work_area(&self, point: DevicePoint) -> Option<DeviceRect> {
        let monitor = unsafe { MonitorFromPoint(POINT { x: point.x, y: point.y }, MONITOR_DEFAULTTONEAREST) };
        if monitor.is_invalid() {
            return None;
        }
        let mut info = MONITORINFO { cbSize: std::mem::size_of::<MONITORINFO>() as u32, ..Default::default() };
        if !unsafe { GetMonitorInfoW(monitor, &mut info) }.as_bool() {
            return None;
        }
        Some(rect_from_win32(info.rcWork))
    }

    fn create_child_surface(&self, parent: WindowHandle, rect: DeviceRect) -> anyhow::Result<WindowHandle> {
        register_surface_class()?;
        let class_name = to_wide(EMBED_SURFACE_CLASS);
        let title = to_wide("");
        let surface = unsafe {
            let module = GetModuleHandleW(None).context("GetModuleHandleW")?;
            CreateWindowExW(
                WS_EX_NOACTIVATE,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(title.as_ptr()),
                WS_CHILD | WS_VISIBLE | WS_CLIPCHILDREN,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                Some(hwnd(parent)),
                None,
                Some(module.into()),
                None,
            )
        }
        .with_context(|| format!("CreateWindowExW under {:?}", parent))?;

        // Attached after creation; freed on WM_NCDESTROY.
        let state = Box::into_raw(Box::new(SurfaceState::default()));
        unsafe { SetWindowLongPtrW(surface, GWLP_USERDATA, state as isize) };
        info!("[Win32] Embed surface {:?} created under {:?} at {:?}", surface, parent, rect);
        Ok(handle(surface))
    }

    fn destroy_surface(&self, surface: WindowHandle) -> anyhow::Result<()> {
        unsafe { DestroyWindow(hwnd(surface)) }.with_context(|| format!("DestroyWindow({:?})", surface))?;
        info!("[Win32] Embed surface {:?} destroyed", surface);
        Ok(())
    }

    fn move_to_bottom(&self, surface: WindowHandle) -> anyhow::Result<()> {
        unsafe {
            SetWindowPos(
                hwnd(surface),
                Some(HWND_BOTTOM),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }
        .with_context(|| format!("SetWindowPos({:?}, HWND_BOTTOM)", surface))
    }

    /// Children present at install time are subclassed; content must be
    /// reparented into the surface before the hook is installed.
    fn set_hit_test_hook(&self, surface: WindowHandle, hook: Option<HitTestHook>) -> anyhow::Result<()> {
        let surface_hwnd = hwnd(surface);
        let state = unsafe { GetWindowLongPtrW(surface_hwnd, GWLP_USERDATA) } as *mut SurfaceState;
        if state.is_null() {
            bail!("{:?} is not an embed surface", surface);
        }
        let installing = hook.is_some();
        unsafe { (*state).hit_test = hook };

        for child in child_windows(surface_hwnd) {
            if installing {
                let ok = unsafe {
                    SetWindowSubclass(child, Some(content_subclass_proc), CONTENT_SUBCLASS_ID, surface_hwnd.0 as usize)
                };
                if !ok.as_bool() {
                    bail!("SetWindowSubclass({:?}) failed; clicks over it would not fall through", child);
                }
                debug!("[Win32] Hit-test subclass on {:?}", child);
            } else if !unsafe { RemoveWindowSubclass(child, Some(content_subclass_proc), CONTENT_SUBCLASS_ID) }
                .as_bool()
            {
                debug!("[Win32] {:?} had no hit-test subclass", child);
            }
        }
        Ok(())
    }
}

//---------------------------------------------------------------------------
// EmbedContent
//---------------------------------------------------------------------------

/// A top-level window whose visuals live in a single content child.
pub struct Win32Content {
    top_level: HWND,
    content: HWND,
    render_mode: RenderMode,
    on_render_mode: Option<Box<dyn FnMut(RenderMode)>>,
}

impl Win32Content {
    pub fn new(top_level: HWND, content: HWND) -> Self {
        Self { top_level, content, render_mode: RenderMode::Default, on_render_mode: None }
    }

    /// Called whenever the embedder switches render mode, so the application
    /// can swap its renderer.
    pub fn with_render_mode_handler(mut self, handler: impl FnMut(RenderMode) + 'static) -> Self {
        self.on_render_mode = Some(Box::new(handler));
        self
    }

    pub fn top_level(&self) -> HWND {
        self.top_level
    }

    pub fn content(&self) -> HWND {
        self.content
    }

    fn reparent(&self, parent: HWND) -> anyhow::Result<()> {
        unsafe { SetParent(self.content, Some(parent)) }
            .with_context(|| format!("SetParent({:?}, {:?})", self.content, parent))?;
        fill_parent(self.content, parent);
        debug!("[Win32] Content {:?} now under {:?}", self.content, parent);
        Ok(())
    }
}

impl EmbedContent for Win32Content {
    fn logical_bounds(&self) -> anyhow::Result<LogicalRect> {
        let mut rc = RECT::default();
        unsafe { GetWindowRect(self.top_level, &mut rc) }
            .with_context(|| format!("GetWindowRect({:?})", self.top_level))?;
        Ok(coordinate_mapper::to_logical(rect_from_win32(rc), self.dpi_scale()))
    }

    fn set_logical_bounds(&mut self, bounds: LogicalRect) -> anyhow::Result<()> {
        let device = coordinate_mapper::to_device_pixels(bounds, self.dpi_scale()).rect;
        unsafe {
            SetWindowPos(
                self.top_level,
                None,
                device.x,
                device.y,
                device.width,
                device.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .with_context(|| format!("SetWindowPos({:?}, {:?})", self.top_level, device))
    }

    fn dpi_scale(&self) -> DpiScale {
        window_dpi_scale(self.top_level)
    }

    fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    fn set_render_mode(&mut self, mode: RenderMode) {
        if self.render_mode == mode {
            return;
        }
        info!("[Win32] Render mode {:?} -> {:?}", self.render_mode, mode);
        self.render_mode = mode;
        if let Some(handler) = self.on_render_mode.as_mut() {
            handler(mode);
        }
    }

    fn reparent_content(&mut self, surface: WindowHandle) -> anyhow::Result<()> {
        self.reparent(hwnd(surface))
    }

    fn restore_content(&mut self) -> anyhow::Result<()> {
        self.reparent(self.top_level)
    }

    fn layout(&mut self, size: LogicalSize) -> anyhow::Result<()> {
        let scale = window_dpi_scale(self.content);
        let w = (size.width * scale.x).round() as i32;
        let h = (size.height * scale.y).round() as i32;
        unsafe { MoveWindow(self.content, 0, 0, w, h, true) }
            .with_context(|| format!("MoveWindow({:?}, {}×{})", self.content, w, h))?;
        // Synchronous paint at the new size.
        if !unsafe { UpdateWindow(self.content) }.as_bool() {
            debug!("[Win32] UpdateWindow({:?}) failed", self.content);
        }
        Ok(())
    }

    /// Repaints the content at its current size; never resizes it.
    fn invalidate_layout(&mut self) {
        let flags = RDW_INVALIDATE | RDW_ERASE | RDW_ALLCHILDREN;
        if !unsafe { RedrawWindow(Some(self.content), None, None, flags) }.as_bool() {
            warn!("[Win32] RedrawWindow({:?}) failed", self.content);
        }
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        let _ = unsafe { ShowWindow(self.top_level, SW_HIDE) };
        Ok(())
    }

    fn show_and_activate(&mut self) -> anyhow::Result<()> {
        unsafe {
            let cmd = if IsIconic(self.top_level).as_bool() { SW_RESTORE } else { SW_SHOWNORMAL };
            let _ = ShowWindow(self.top_level, cmd);
            if !SetForegroundWindow(self.top_level).as_bool() {
                debug!("[Win32] SetForegroundWindow({:?}) refused", self.top_level);
            }
            let _ = SetFocus(Some(self.content));
        }
        if !unsafe { IsWindowVisible(self.top_level) }.as_bool() {
            bail!("{:?} is still hidden", self.top_level);
        }
        Ok(())
    }
}

//---------------------------------------------------------------------------
// Click-through helpers
//---------------------------------------------------------------------------

/// Hit-test root backed by a window's client area.
pub struct Win32HitTestRoot {
    root: HWND,
}

impl Win32HitTestRoot {
    pub fn new(root: HWND) -> Self {
        Self { root }
    }
}

impl HitTestRoot for Win32HitTestRoot {
    fn point_from_screen(&self, screen: DevicePoint) -> Option<LogicalPoint> {
        let mut pt = POINT { x: screen.x, y: screen.y };
        if !unsafe { ScreenToClient(self.root, &mut pt) }.as_bool() {
            return None;
        }
        let scale = window_dpi_scale(self.root);
        Some(LogicalPoint { x: pt.x as f64 / scale.x, y: pt.y as f64 / scale.y })
    }
}

/// A child control (e.g. the pin button) used as the clickable region.
pub struct ChildWindowRegion {
    root: HWND,
    control: HWND,
}

impl ChildWindowRegion {
    pub fn new(root: HWND, control: HWND) -> Self {
        Self { root, control }
    }
}

impl ClickableRegion for ChildWindowRegion {
    fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.control) }.as_bool()
    }

    fn bounds(&self) -> Option<LogicalRect> {
        let mut rc = RECT::default();
        unsafe { GetWindowRect(self.control, &mut rc) }.ok()?;
        let mut origin = POINT { x: rc.left, y: rc.top };
        if !unsafe { ScreenToClient(self.root, &mut origin) }.as_bool() {
            return None;
        }
        let scale = window_dpi_scale(self.root);
        Some(LogicalRect::new(
            origin.x as f64 / scale.x,
            origin.y as f64 / scale.y,
            (rc.right - rc.left) as f64 / scale.x,
            (rc.bottom - rc.top) as f64 / scale.y,
        ))
    }
}

/// Embedder for a native top-level window hosting `content`.
pub fn desktop_embedder(
    top_level: HWND,
    content: HWND,
    config: EmbedConfig,
) -> DesktopEmbedder<Win32WindowSystem, Win32Content> {
    DesktopEmbedder::new(Win32WindowSystem, Win32Content::new(top_level, content), config)
}
