use std::time::Duration;

/// Class of the shell window that anchors the desktop hierarchy.
pub const DESKTOP_MANAGER_CLASS: &str = "Progman";

/// Class of the shell-created helper windows that can host wallpaper content.
pub const HELPER_WINDOW_CLASS: &str = "WorkerW";

/// Class of the window hosting the desktop icon grid.
pub const ICON_VIEW_CLASS: &str = "SHELLDLL_DefView";

/// Undocumented message asking `Progman` to spawn a `WorkerW` behind the icons.
pub const WM_SPAWN_WORKER: u32 = 0x052C;

/// `(wParam, lParam)` pairs tried in order when sending [`WM_SPAWN_WORKER`].
/// Older shells only react to the first, some newer builds only to the second.
pub const SPAWN_WORKER_PARAMS: &[(usize, isize)] = &[(0x0D, 0x01), (0, 0)];

/// Round-trip timeout for the spawn request.
pub const SPAWN_WORKER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Full enumeration passes per spawn strategy.
pub const LOCATE_RETRY_ATTEMPTS: u32 = 5;

/// Pause between enumeration passes.
pub const LOCATE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Window class registered for the child surface created inside the host.
pub const EMBED_SURFACE_CLASS: &str = "DESKTOP_EMBED_HOST_SURFACE";

/// Logical pixels per inch; a DPI of 96 is a scale factor of 1.0.
pub const BASE_DPI: f64 = 96.0;

/// How often the reminder scanner polls for due reminders.
pub const REMINDER_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default window placement (logical units) when no settings were persisted.
pub const DEFAULT_WINDOW_X: f64 = 100.0;
pub const DEFAULT_WINDOW_Y: f64 = 100.0;
pub const DEFAULT_WINDOW_WIDTH: f64 = 300.0;
pub const DEFAULT_WINDOW_HEIGHT: f64 = 400.0;
