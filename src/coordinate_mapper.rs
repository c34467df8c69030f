//! Logical ↔ device conversion and monitor → host re-projection.
//!
//! The host window (a `WorkerW` or `SHELLDLL_DefView`) usually spans the whole
//! virtual desktop, so its client origin is neither the monitor origin nor the
//! window's own origin. Placement therefore goes through monitor-relative
//! percentages and is re-anchored onto the host's client space.

use log::debug;

use crate::geometry::{DevicePoint, DeviceRect, DpiScale, Geometry, LogicalRect};

/// Window placement as fractions of a monitor work area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementPercent {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

pub fn to_device_pixels(logical: LogicalRect, scale: DpiScale) -> Geometry {
    let rect = DeviceRect {
        x: (logical.x * scale.x).round() as i32,
        y: (logical.y * scale.y).round() as i32,
        width: (logical.width * scale.x).round() as i32,
        height: (logical.height * scale.y).round() as i32,
    };
    Geometry { rect, scale }
}

/// Inverse of [`to_device_pixels`], without rounding.
pub fn to_logical(device: DeviceRect, scale: DpiScale) -> LogicalRect {
    let sx = if scale.x > 0.0 { scale.x } else { 1.0 };
    let sy = if scale.y > 0.0 { scale.y } else { 1.0 };
    LogicalRect {
        x: device.x as f64 / sx,
        y: device.y as f64 / sy,
        width: device.width as f64 / sx,
        height: device.height as f64 / sy,
    }
}

/// Placement of `device` relative to `work_area`. A degenerate work area
/// axis yields zero for that axis.
pub fn to_percent(device: DeviceRect, work_area: DeviceRect) -> PlacementPercent {
    let ratio = |value: i32, extent: i32| {
        if extent > 0 { value as f64 / extent as f64 } else { 0.0 }
    };
    PlacementPercent {
        left: ratio(device.x - work_area.x, work_area.width),
        top: ratio(device.y - work_area.y, work_area.height),
        width: ratio(device.width, work_area.width),
        height: ratio(device.height, work_area.height),
    }
}

/// Projects a placement onto `work_area`, expressed in the client space of a
/// host whose screen origin is `host_origin`.
pub fn project(percent: PlacementPercent, work_area: DeviceRect, host_origin: DevicePoint) -> DeviceRect {
    let offset_x = work_area.x - host_origin.x;
    let offset_y = work_area.y - host_origin.y;
    DeviceRect {
        x: offset_x + (percent.left * work_area.width as f64).round() as i32,
        y: offset_y + (percent.top * work_area.height as f64).round() as i32,
        width: (percent.width * work_area.width as f64).round() as i32,
        height: (percent.height * work_area.height as f64).round() as i32,
    }
}

pub fn to_host_relative(device: DeviceRect, work_area: DeviceRect, host_origin: DevicePoint) -> DeviceRect {
    let percent = to_percent(device, work_area);
    let relative = project(percent, work_area, host_origin);
    debug!(
        "[Mapper] screen {:?} on work area {:?} = {:.1}%/{:.1}% {:.1}%x{:.1}% -> host-relative {:?} (host origin {:?})",
        device,
        work_area,
        percent.left * 100.0,
        percent.top * 100.0,
        percent.width * 100.0,
        percent.height * 100.0,
        relative,
        host_origin
    );
    relative
}

/// New logical bounds for an OS-suggested device rectangle after a DPI change.
pub fn on_dpi_changed(new_device_rect: DeviceRect, new_scale: DpiScale) -> LogicalRect {
    to_logical(new_device_rect, new_scale)
}
