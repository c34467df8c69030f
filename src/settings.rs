//! Persisted window placement and embed preference.
//!
//! The store itself belongs to the application; [`JsonSettingsStore`] is the
//! file-backed default.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::EmbedConfig;
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_X, DEFAULT_WINDOW_Y};
use crate::geometry::LogicalRect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedSettings {
    pub window_x: f64,
    pub window_y: f64,
    pub window_width: f64,
    pub window_height: f64,
    /// Whether the window should live on the desktop at startup.
    pub embed_desktop: bool,
    pub embed: EmbedConfig,
}

impl EmbedSettings {
    pub fn bounds(&self) -> LogicalRect {
        LogicalRect::new(self.window_x, self.window_y, self.window_width, self.window_height)
    }

    pub fn set_bounds(&mut self, bounds: LogicalRect) {
        self.window_x = bounds.x;
        self.window_y = bounds.y;
        self.window_width = bounds.width;
        self.window_height = bounds.height;
    }
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            window_x: DEFAULT_WINDOW_X,
            window_y: DEFAULT_WINDOW_Y,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            embed_desktop: true,
            embed: EmbedConfig::default(),
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> anyhow::Result<EmbedSettings>;

    fn save(&self, settings: &EmbedSettings) -> anyhow::Result<()>;
}

pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    /// A missing file yields defaults; a malformed one is an error.
    fn load(&self) -> anyhow::Result<EmbedSettings> {
        if !self.path.exists() {
            info!("[Settings] {} not found; using defaults", self.path.display());
            return Ok(EmbedSettings::default());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading settings from {}", self.path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", self.path.display()))?;
        debug!("[Settings] Loaded {:?}", settings);
        Ok(settings)
    }

    fn save(&self, settings: &EmbedSettings) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text).with_context(|| format!("writing settings to {}", self.path.display()))?;
        debug!("[Settings] Saved to {}", self.path.display());
        Ok(())
    }
}
