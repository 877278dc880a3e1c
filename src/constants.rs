// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use image::Rgba;
use std::time::Duration;

/// Color assigned to depth samples whose mapped color coordinate falls
/// outside the color frame (opaque red)
pub const SENTINEL_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Color used for points of a mesh that carries no per-point colors
pub const DEFAULT_POINT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Millimeters per meter (depth samples are stored in millimeters)
pub const MM_PER_METER: f32 = 1000.0;

/// Weight of the previous positions when smoothing the color-frame cloud
pub const DEFAULT_SMOOTHING: f32 = 0.5;

/// Scale applied to camera-space meters before drawing the 3D view
pub const DEFAULT_WORLD_SCALE: f32 = 100.0;

/// Depth sensor constants
pub mod depth {
    /// Invalid depth marker value
    pub const DEPTH_INVALID_MM: u16 = 0;
    /// Maximum depth the synthetic sensor reports (millimeters)
    pub const DEPTH_MAX_MM: u16 = 8000;
}

/// Default frame sizes for the synthetic sensor
pub mod frames {
    pub const DEPTH_WIDTH: u32 = 320;
    pub const DEPTH_HEIGHT: u32 = 240;
    pub const COLOR_WIDTH: u32 = 640;
    pub const COLOR_HEIGHT: u32 = 480;
    pub const FPS: u32 = 30;
}

/// Keyboard bindings for the terminal viewer
pub mod keys {
    /// Mode keys, in mode order (World Auto .. Registered Image)
    pub const MODE_KEYS: [char; 5] = ['1', '2', '3', '4', '5'];
    pub const QUIT: char = 'q';
    pub const RESET_VIEW: char = 'r';
    pub const ZOOM_IN: char = '+';
    pub const ZOOM_OUT: char = '-';
}

/// Orbit camera defaults
pub mod camera {
    /// Radians of orbit per arrow key press
    pub const ORBIT_STEP: f32 = 0.08;
    /// Radians of orbit per canvas pixel of mouse drag
    pub const DRAG_SENSITIVITY: f32 = 0.02;
    /// Zoom multiplier per key press or scroll tick
    pub const ZOOM_STEP: f32 = 1.1;
    /// Vertical field of view (radians)
    pub const FOV_Y: f32 = 0.9;
    /// Default distance from the orbit target, in world-scaled units
    pub const DISTANCE: f32 = 250.0;
    /// Distance of the orbit target in front of the sensor (meters)
    pub const TARGET_DEPTH_M: f32 = 1.5;
    /// Pitch limit (radians), just short of straight up/down
    pub const PITCH_LIMIT: f32 = 1.5;
    /// Near plane in world-scaled units
    pub const NEAR: f32 = 1.0;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Input poll timeout per loop iteration (~60 Hz redraw)
    pub const INPUT_POLL: Duration = Duration::from_millis(16);

    /// Smoothing factor for the frame rate meter
    pub const FPS_SMOOTHING: f64 = 0.9;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Application information utilities
pub mod app_info {
    /// Application name used for the config directory
    pub const APP_NAME: &str = "depth-mapping";

    /// Config file name inside the config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Get the application version from the package manifest
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
