//! The embedding façade: locate → map → attach → arm router, and back.
//!
//! `DesktopEmbedder` is `!Send` (it holds the router in an `Rc`), so it can
//! only be driven from the thread that created it, which must be the thread
//! owning the application window.

use std::rc::Rc;

use log::{info, warn};

use crate::click_through::{ClickThroughRouter, ClickableRegion, HitTestRoot};
use crate::config::EmbedConfig;
use crate::content::EmbedContent;
use crate::coordinate_mapper;
use crate::embed_host::{EmbedHost, EmbedSession};
use crate::error::{AttachStep, EmbedError};
use crate::geometry::{DeviceRect, DpiScale, Geometry, LogicalRect};
use crate::locator::WindowHierarchyLocator;
use crate::settings::EmbedSettings;
use crate::state_machine::{EmbedState, EmbedStateMachine, Transition};
use crate::window_system::{WindowHandle, WindowSystem};

pub struct DesktopEmbedder<W: WindowSystem, C: EmbedContent> {
    windows: W,
    content: C,
    config: EmbedConfig,
    state: EmbedStateMachine,
    session: Option<EmbedSession>,
    router: Rc<ClickThroughRouter>,
    /// Persisted preference; only changed by a successful embed or an explicit detach.
    embed_preferred: bool,
}

impl<W: WindowSystem, C: EmbedContent> DesktopEmbedder<W, C> {
    pub fn new(windows: W, content: C, config: EmbedConfig) -> Self {
        Self {
            windows,
            content,
            config,
            state: EmbedStateMachine::new(),
            session: None,
            router: ClickThroughRouter::new(),
            embed_preferred: false,
        }
    }

    pub fn state(&self) -> EmbedState {
        self.state.state()
    }

    pub fn is_embedded(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&EmbedSession> {
        self.session.as_ref()
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Embeds the window into the desktop. A no-op if already embedded.
    ///
    /// On error nothing has changed: the window is still a normal top-level window.
    pub fn embed(&mut self) -> Result<(), EmbedError> {
        match self.state.begin_embed() {
            Transition::Proceed => {}
            Transition::AlreadyDone | Transition::Busy => return Ok(()),
        }

        let located = WindowHierarchyLocator::new(&self.windows, &self.config).locate();
        let (host, host_kind) = match located {
            Ok(found) => found,
            Err(e) => {
                warn!("[Embedder] {}; staying windowed", e);
                self.state.finish_embed(false);
                return Err(e);
            }
        };

        let embed_host = EmbedHost::new(&self.windows, self.config.software_render_when_embedded);
        let attached = self
            .target_geometry(host)
            .and_then(|target| embed_host.attach(&mut self.content, host, host_kind, target));
        let mut session = match attached {
            Ok(session) => session,
            Err(e) => {
                self.state.finish_embed(false);
                return Err(e);
            }
        };

        if self.router.is_enabled() {
            if let Err(e) = embed_host.install_hook(&mut session, self.router.hook()) {
                warn!("[Embedder] Click-through unavailable: {:#}", e);
            }
        }

        self.session = Some(session);
        self.embed_preferred = true;
        self.state.finish_embed(true);
        info!("[Embedder] Embedded via {:?} {:?}", host_kind, host);
        Ok(())
    }

    /// Device geometry of the window, re-anchored to `host`'s client space.
    fn target_geometry(&self, host: WindowHandle) -> Result<Geometry, EmbedError> {
        let logical = self
            .content
            .logical_bounds()
            .map_err(|e| EmbedError::attach(AttachStep::ReadBounds, e))?;
        let scale = self.content.dpi_scale();
        let screen = coordinate_mapper::to_device_pixels(logical, scale);
        info!("[Embedder] Logical {:?} -> screen {:?} @ {:?}", logical, screen.rect, scale);

        let Some(work_area) = self.windows.monitor_work_area(screen.rect.center()) else {
            warn!("[Embedder] No monitor for {:?}; using screen coordinates", screen.rect.center());
            return Ok(screen);
        };
        let Some(host_rect) = self.windows.window_rect(host) else {
            warn!("[Embedder] GetWindowRect({:?}) failed; using screen coordinates", host);
            return Ok(screen);
        };

        Ok(Geometry {
            rect: coordinate_mapper::to_host_relative(screen.rect, work_area, host_rect.origin()),
            scale,
        })
    }

    /// Puts the window back on screen at its pre-embed logical bounds.
    ///
    /// Always ends detached with the window visible; the returned errors are
    /// the restoration steps that failed along the way (already logged).
    pub fn detach(&mut self) -> Vec<EmbedError> {
        match self.state.begin_detach() {
            Transition::Proceed => {}
            Transition::AlreadyDone | Transition::Busy => return Vec::new(),
        }

        let embed_host = EmbedHost::new(&self.windows, self.config.software_render_when_embedded);
        let failures = match self.session.take() {
            Some(session) => embed_host.detach(&mut self.content, session),
            None => Vec::new(),
        };
        self.embed_preferred = false;
        self.state.finish_detach();
        failures
    }

    /// Pin-button behavior. Returns whether the window is embedded afterwards.
    pub fn toggle(&mut self) -> Result<bool, EmbedError> {
        if self.is_embedded() {
            self.detach();
            Ok(false)
        } else {
            self.embed()?;
            Ok(true)
        }
    }

    /// Routes clicks outside `region` to the desktop while embedded. Takes
    /// effect immediately when embedded, otherwise on the next embed.
    pub fn enable_click_through(&mut self, root: Rc<dyn HitTestRoot>, region: Rc<dyn ClickableRegion>) {
        self.router.enable(root, region);
        let hook = self.router.hook();
        let embed_host = EmbedHost::new(&self.windows, self.config.software_render_when_embedded);
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = embed_host.install_hook(session, hook) {
                warn!("[Embedder] Installing click-through hook failed: {:#}", e);
            }
        }
    }

    pub fn disable_click_through(&mut self) {
        self.router.disable();
        let embed_host = EmbedHost::new(&self.windows, self.config.software_render_when_embedded);
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = embed_host.remove_hook(session) {
                warn!("[Embedder] Removing click-through hook failed: {:#}", e);
            }
        }
    }

    pub fn is_click_through_enabled(&self) -> bool {
        self.router.is_enabled()
    }

    pub fn router(&self) -> &Rc<ClickThroughRouter> {
        &self.router
    }

    /// Handles an OS DPI-change notification carrying the suggested device rectangle.
    pub fn on_dpi_changed(&mut self, new_device_rect: DeviceRect, new_scale: DpiScale) -> LogicalRect {
        let logical = coordinate_mapper::on_dpi_changed(new_device_rect, new_scale);
        info!("[Embedder] DPI changed to {:?}: {:?} -> logical {:?}", new_scale, new_device_rect, logical);

        match self.session.as_mut() {
            Some(session) => {
                session.set_saved_bounds(logical);
                if let Err(e) = self.content.layout(logical.size()) {
                    warn!("[Embedder] Relayout after DPI change failed: {:#}", e);
                }
            }
            None => {
                if let Err(e) = self.content.set_logical_bounds(logical) {
                    warn!("[Embedder] Applying bounds after DPI change failed: {:#}", e);
                }
            }
        }
        self.content.invalidate_layout();
        logical
    }

    /// Applies persisted settings: bounds, then embedding if the user wants it.
    /// Settings that turn embedding off detach an embedded window first.
    /// Returns whether the window ended up embedded; failures fall back to a
    /// normal window.
    pub fn restore_from_settings(&mut self, settings: &EmbedSettings) -> bool {
        if !settings.embed_desktop && self.is_embedded() {
            info!("[Embedder] Embedding disabled by settings; detaching");
            self.detach();
        }
        self.embed_preferred = settings.embed_desktop;
        if !self.is_embedded() {
            if let Err(e) = self.content.set_logical_bounds(settings.bounds()) {
                warn!("[Embedder] Applying saved bounds failed: {:#}", e);
            }
        }
        if !settings.embed_desktop {
            return false;
        }
        match self.embed() {
            Ok(()) => true,
            Err(e) => {
                warn!("[Embedder] Embedding at startup failed: {}", e);
                false
            }
        }
    }

    /// Settings to persist. While embedded the session snapshot is used: the
    /// top-level window is hidden and its live bounds are meaningless.
    pub fn capture_settings(&self) -> anyhow::Result<EmbedSettings> {
        let bounds = match &self.session {
            Some(session) => session.saved_bounds(),
            None => self.content.logical_bounds()?,
        };
        let mut settings = EmbedSettings {
            embed_desktop: self.embed_preferred,
            embed: self.config.clone(),
            ..Default::default()
        };
        settings.set_bounds(bounds);
        Ok(settings)
    }

    /// Shutdown: capture settings, then detach without touching the preference.
    /// The window is detached even when the settings could not be captured.
    pub fn shutdown(&mut self) -> anyhow::Result<EmbedSettings> {
        let preferred = self.embed_preferred;
        let settings = self.capture_settings();
        self.detach();
        self.embed_preferred = preferred;
        settings
    }
}
