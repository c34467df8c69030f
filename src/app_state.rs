//! Per-surface state stored in `GWLP_USERDATA` of the embed host surface.

use crate::window_system::HitTestHook;

/// Owned by the surface window; freed on `WM_NCDESTROY`.
#[derive(Default)]
pub struct SurfaceState {
    /// Consulted on `WM_NCHITTEST` while click-through is armed.
    pub hit_test: Option<HitTestHook>,
}
