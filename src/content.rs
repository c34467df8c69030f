//! The application surface that gets moved in and out of the desktop.

use crate::geometry::{DpiScale, LogicalRect, LogicalSize};
use crate::window_system::WindowHandle;

/// Rendering acceleration requested from the application's renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Default,
    /// CPU rendering. Hardware surfaces do not composite reliably as children
    /// of the shell's helper windows.
    SoftwareOnly,
}

/// A top-level window plus the visual content it presents.
///
/// All methods are called on the thread that owns the window.
pub trait EmbedContent {
    /// Current bounds of the top-level presentation, in logical units.
    /// These become the restore target, so an unreadable rectangle is an error.
    fn logical_bounds(&self) -> anyhow::Result<LogicalRect>;

    fn set_logical_bounds(&mut self, bounds: LogicalRect) -> anyhow::Result<()>;

    /// Scale of the monitor the top-level presentation is currently on.
    fn dpi_scale(&self) -> DpiScale;

    fn render_mode(&self) -> RenderMode;

    fn set_render_mode(&mut self, mode: RenderMode);

    /// Moves the content out of the top-level presentation into `surface`.
    fn reparent_content(&mut self, surface: WindowHandle) -> anyhow::Result<()>;

    /// Puts the content back into the top-level presentation.
    fn restore_content(&mut self) -> anyhow::Result<()>;

    /// Synchronous layout pass at `size` (logical).
    fn layout(&mut self, size: LogicalSize) -> anyhow::Result<()>;

    /// Marks the layout dirty so it is recomputed on the next pass.
    fn invalidate_layout(&mut self);

    fn hide(&mut self) -> anyhow::Result<()>;

    /// Shows the top-level presentation (restoring it if minimized) and activates it.
    fn show_and_activate(&mut self) -> anyhow::Result<()>;
}
