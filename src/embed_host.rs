//! Moves the application content into a child surface of the desktop host and back.
//!
//! ## Attach
//! 1. Snapshot logical bounds and render mode into the session.
//! 2. Switch to software rendering.
//! 3. Create the child surface under the host and move the content into it.
//! 4. Lay the content out at its original *logical* size.
//! 5. Send the surface to the bottom of the host's z-order (not for `IconView`,
//!    where that would hide it behind the icon list for good).
//! 6. Hide the top-level window.
//!
//! A failure in 3–5 is rolled back so the top-level window stays usable.
//!
//! ## Detach
//! Every step is attempted even if an earlier one failed; failures are logged
//! and returned as [`EmbedError::DetachPartialFailure`].

use log::{debug, error, info, warn};

use crate::content::{EmbedContent, RenderMode};
use crate::error::{AttachStep, DetachStep, EmbedError};
use crate::geometry::{Geometry, LogicalRect, LogicalSize};
use crate::locator::HostKind;
use crate::window_system::{HitTestHook, WindowHandle, WindowSystem};

/// Everything needed to undo an attach. Exists exactly while embedded.
#[derive(Debug)]
pub struct EmbedSession {
    saved_bounds: LogicalRect,
    saved_render_mode: RenderMode,
    host: WindowHandle,
    host_kind: HostKind,
    surface: WindowHandle,
    hook_installed: bool,
}

impl EmbedSession {
    /// Logical bounds the top-level window gets back on detach.
    pub fn saved_bounds(&self) -> LogicalRect {
        self.saved_bounds
    }

    pub fn saved_render_mode(&self) -> RenderMode {
        self.saved_render_mode
    }

    pub fn host(&self) -> WindowHandle {
        self.host
    }

    pub fn host_kind(&self) -> HostKind {
        self.host_kind
    }

    /// The child surface created inside the host.
    pub fn surface(&self) -> WindowHandle {
        self.surface
    }

    pub fn hook_installed(&self) -> bool {
        self.hook_installed
    }

    pub(crate) fn set_saved_bounds(&mut self, bounds: LogicalRect) {
        self.saved_bounds = bounds;
    }
}

pub struct EmbedHost<'a, W: WindowSystem> {
    windows: &'a W,
    software_render: bool,
}

impl<'a, W: WindowSystem> EmbedHost<'a, W> {
    pub fn new(windows: &'a W, software_render: bool) -> Self {
        Self { windows, software_render }
    }

    pub fn attach<C: EmbedContent>(
        &self,
        content: &mut C,
        host: WindowHandle,
        host_kind: HostKind,
        target: Geometry,
    ) -> Result<EmbedSession, EmbedError> {
        let saved_bounds = content
            .logical_bounds()
            .map_err(|e| EmbedError::attach(AttachStep::ReadBounds, e))?;
        let saved_render_mode = content.render_mode();
        info!(
            "[EmbedHost] Attaching to {:?} ({:?}): logical {:?}, device {:?} @ {:?}",
            host, host_kind, saved_bounds, target.rect, target.scale
        );

        if self.software_render {
            content.set_render_mode(RenderMode::SoftwareOnly);
        }

        let mut created = None;
        let surface = match self.attach_steps(content, host, host_kind, target, saved_bounds.size(), &mut created) {
            Ok(surface) => surface,
            Err(err) => {
                error!("[EmbedHost] {}; rolling back", err);
                self.rollback(content, created, saved_render_mode);
                return Err(err);
            }
        };

        if let Err(e) = content.hide() {
            warn!("[EmbedHost] Hiding top-level window failed: {:#}", e);
        }

        info!("[EmbedHost] Embedded as surface {:?} under {:?}", surface, host);
        Ok(EmbedSession {
            saved_bounds,
            saved_render_mode,
            host,
            host_kind,
            surface,
            hook_installed: false,
        })
    }

    fn attach_steps<C: EmbedContent>(
        &self,
        content: &mut C,
        host: WindowHandle,
        host_kind: HostKind,
        target: Geometry,
        logical_size: LogicalSize,
        created: &mut Option<WindowHandle>,
    ) -> Result<WindowHandle, EmbedError> {
        let surface = self
            .windows
            .create_child_surface(host, target.rect)
            .map_err(|e| EmbedError::attach(AttachStep::CreateSurface, e))?;
        *created = Some(surface);
        debug!("[EmbedHost] Surface {:?} created at {:?}", surface, target.rect);

        content
            .reparent_content(surface)
            .map_err(|e| EmbedError::attach(AttachStep::ReparentContent, e))?;

        content
            .layout(logical_size)
            .map_err(|e| EmbedError::attach(AttachStep::Layout, e))?;

        if host_kind == HostKind::IconView {
            debug!("[EmbedHost] Host is the icon view; keeping default z-order");
        } else {
            self.windows
                .move_to_bottom(surface)
                .map_err(|e| EmbedError::attach(AttachStep::ZOrder, e))?;
        }
        Ok(surface)
    }

    fn rollback<C: EmbedContent>(&self, content: &mut C, surface: Option<WindowHandle>, render_mode: RenderMode) {
        if let Some(surface) = surface {
            // Content first: destroying the surface would take its children with it.
            if let Err(e) = content.restore_content() {
                error!("[EmbedHost] Rollback: restoring content failed: {:#}", e);
            }
            if let Err(e) = self.windows.destroy_surface(surface) {
                warn!("[EmbedHost] Rollback: destroying surface {:?} failed: {:#}", surface, e);
            }
        }
        content.set_render_mode(render_mode);
    }

    /// Arms the hit-test hook on the session's surface.
    pub fn install_hook(&self, session: &mut EmbedSession, hook: HitTestHook) -> anyhow::Result<()> {
        self.windows.set_hit_test_hook(session.surface, Some(hook))?;
        session.hook_installed = true;
        info!("[EmbedHost] Click-through hook installed on {:?}", session.surface);
        Ok(())
    }

    pub fn remove_hook(&self, session: &mut EmbedSession) -> anyhow::Result<()> {
        if !session.hook_installed {
            return Ok(());
        }
        // Cleared even when the removal below fails.
        session.hook_installed = false;
        self.windows.set_hit_test_hook(session.surface, None)?;
        info!("[EmbedHost] Click-through hook removed from {:?}", session.surface);
        Ok(())
    }

    /// Restores the top-level presentation and consumes the session.
    pub fn detach<C: EmbedContent>(&self, content: &mut C, mut session: EmbedSession) -> Vec<EmbedError> {
        info!(
            "[EmbedHost] Detaching surface {:?}; restoring logical {:?}",
            session.surface, session.saved_bounds
        );
        let mut failures = Vec::new();
        let mut record = |step: DetachStep, result: anyhow::Result<()>| -> bool {
            match result {
                Ok(()) => true,
                Err(e) => {
                    let err = EmbedError::detach(step, e);
                    warn!("[EmbedHost] {}", err);
                    failures.push(err);
                    false
                }
            }
        };

        record(DetachStep::RemoveHook, self.remove_hook(&mut session));

        if record(DetachStep::RestoreContent, content.restore_content()) {
            record(DetachStep::DestroySurface, self.windows.destroy_surface(session.surface));
        } else {
            warn!(
                "[EmbedHost] Leaving surface {:?} alive; the content may still be parented to it",
                session.surface
            );
        }

        record(DetachStep::RestoreBounds, content.set_logical_bounds(session.saved_bounds));
        content.set_render_mode(session.saved_render_mode);
        record(DetachStep::ShowWindow, content.show_and_activate());

        if failures.is_empty() {
            info!("[EmbedHost] Detach complete");
        } else {
            warn!("[EmbedHost] Detach complete with {} partial failure(s)", failures.len());
        }
        failures
    }
}
