//! Plain geometry value types shared by the mapper, the host and the router.
//!
//! Logical values are DPI-independent `f64`s; device values are whole pixels.

use serde::{Deserialize, Serialize};

use crate::constants::BASE_DPI;

/// Per-axis DPI scale factor (1.0 == 96 DPI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DpiScale {
    pub x: f64,
    pub y: f64,
}

impl DpiScale {
    pub const IDENTITY: DpiScale = DpiScale { x: 1.0, y: 1.0 };

    pub fn uniform(scale: f64) -> Self {
        Self { x: scale, y: scale }
    }

    /// Scale for a raw DPI value as reported by the OS. A zero DPI (window
    /// already destroyed) maps to identity.
    pub fn from_dpi(dpi_x: u32, dpi_y: u32) -> Self {
        let axis = |dpi: u32| if dpi == 0 { 1.0 } else { dpi as f64 / BASE_DPI };
        Self { x: axis(dpi_x), y: axis(dpi_y) }
    }
}

impl Default for DpiScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

/// Rectangle in logical units. This is what gets persisted and restored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LogicalRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> LogicalSize {
        LogicalSize { width: self.width, height: self.height }
    }

    /// Closed containment: points on any edge are inside.
    pub fn contains(&self, point: LogicalPoint) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

/// Rectangle in physical pixels, origin + size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DeviceRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { x: left, y: top, width: right - left, height: bottom - top }
    }

    pub fn origin(&self) -> DevicePoint {
        DevicePoint { x: self.x, y: self.y }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> DevicePoint {
        DevicePoint { x: self.x + self.width / 2, y: self.y + self.height / 2 }
    }
}

/// Device rectangle together with the scale it was derived with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub rect: DeviceRect,
    pub scale: DpiScale,
}
