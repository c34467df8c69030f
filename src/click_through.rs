//! Lets pointer input fall through the embedded surface to the desktop icons,
//! except over one interactive control (typically the pin/unpin button).
//!
//! The router answers `WM_NCHITTEST` for the surface: `HTTRANSPARENT` makes
//! Windows deliver the click to the next window underneath.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, info};

use crate::geometry::{DevicePoint, LogicalPoint, LogicalRect};
use crate::window_system::{HitTest, HitTestHook};

/// Converts screen pixels into the content root's logical coordinates.
pub trait HitTestRoot {
    /// `None` when the root is not currently presented.
    fn point_from_screen(&self, screen: DevicePoint) -> Option<LogicalPoint>;
}

/// The control that must stay clickable. Queried on every hit test because
/// its visibility and layout can change at any time.
pub trait ClickableRegion {
    fn is_visible(&self) -> bool;

    /// Bounds relative to the [`HitTestRoot`], in logical units.
    fn bounds(&self) -> Option<LogicalRect>;
}

struct RouteTarget {
    root: Rc<dyn HitTestRoot>,
    region: Rc<dyn ClickableRegion>,
}

#[derive(Default)]
pub struct ClickThroughRouter {
    enabled: Cell<bool>,
    target: RefCell<Option<RouteTarget>>,
}

impl ClickThroughRouter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn enable(&self, root: Rc<dyn HitTestRoot>, region: Rc<dyn ClickableRegion>) {
        *self.target.borrow_mut() = Some(RouteTarget { root, region });
        self.enabled.set(true);
        info!("[ClickThrough] Enabled");
    }

    pub fn disable(&self) {
        self.enabled.set(false);
        self.target.borrow_mut().take();
        info!("[ClickThrough] Disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn hit_test(&self, screen: DevicePoint) -> HitTest {
        if !self.enabled.get() {
            return HitTest::Client;
        }
        let Ok(target) = self.target.try_borrow() else {
            return HitTest::Client;
        };
        let Some(target) = target.as_ref() else {
            return HitTest::Client;
        };

        let Some(point) = target.root.point_from_screen(screen) else {
            return HitTest::Transparent;
        };
        let over_region = target.region.is_visible()
            && target.region.bounds().is_some_and(|bounds| bounds.contains(point));

        if over_region {
            debug!("[ClickThrough] {:?} -> {:?} over clickable region", screen, point);
            HitTest::Client
        } else {
            HitTest::Transparent
        }
    }

    /// Hook for [`crate::window_system::WindowSystem::set_hit_test_hook`].
    /// Holds the router weakly; once the router is gone every point is `Client`.
    pub fn hook(self: &Rc<Self>) -> HitTestHook {
        let router: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |screen: DevicePoint| match router.upgrade() {
            Some(router) => router.hit_test(screen),
            None => HitTest::Client,
        })
    }
}
