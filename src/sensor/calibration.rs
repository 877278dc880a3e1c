// SPDX-License-Identifier: GPL-3.0-only

//! Depth and color camera calibration
//!
//! Intrinsics are stored at a reference resolution and scaled to the actual
//! frame size when a mapper is built, so one calibration serves every
//! resolution the sensor streams at.
//!
//! Reference values are the Kinect v1 factory defaults at 640x480.

use serde::{Deserialize, Serialize};

/// Kinect depth camera intrinsics at 640x480
pub mod kinect {
    /// Focal length X (pixels) at 640x480 base resolution
    pub const FX: f32 = 594.21;
    /// Focal length Y (pixels) at 640x480 base resolution
    pub const FY: f32 = 591.04;
    /// Principal point X (pixels) at 640x480 base resolution
    pub const CX: f32 = 339.5;
    /// Principal point Y (pixels) at 640x480 base resolution
    pub const CY: f32 = 242.7;

    /// RGB camera focal length (pixels) at 640x480
    pub const RGB_F: f32 = 525.0;
    /// RGB camera principal point X at 640x480
    pub const RGB_CX: f32 = 319.5;
    /// RGB camera principal point Y at 640x480
    pub const RGB_CY: f32 = 239.5;

    /// Horizontal distance between the IR and RGB cameras (meters)
    pub const BASELINE_M: f32 = 0.025;

    /// Base width for intrinsics calculation
    pub const BASE_WIDTH: u32 = 640;
    /// Base height for intrinsics calculation
    pub const BASE_HEIGHT: u32 = 480;
}

/// Pinhole intrinsics defined at a reference resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    /// Resolution the values above were measured at
    pub base_width: u32,
    pub base_height: u32,
}

impl CameraIntrinsics {
    /// Kinect depth (IR) camera defaults
    pub fn kinect_depth() -> Self {
        Self {
            fx: kinect::FX,
            fy: kinect::FY,
            cx: kinect::CX,
            cy: kinect::CY,
            base_width: kinect::BASE_WIDTH,
            base_height: kinect::BASE_HEIGHT,
        }
    }

    /// Kinect RGB camera defaults
    pub fn kinect_color() -> Self {
        Self {
            fx: kinect::RGB_F,
            fy: kinect::RGB_F,
            cx: kinect::RGB_CX,
            cy: kinect::RGB_CY,
            base_width: kinect::BASE_WIDTH,
            base_height: kinect::BASE_HEIGHT,
        }
    }

    /// Intrinsics for a frame of `width`×`height`
    pub fn scaled_to(&self, width: u32, height: u32) -> Self {
        if width == self.base_width && height == self.base_height {
            return *self;
        }
        let sx = width as f32 / self.base_width.max(1) as f32;
        let sy = height as f32 / self.base_height.max(1) as f32;
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
            base_width: width,
            base_height: height,
        }
    }

    /// Ray through pixel (u, v) at unit depth, y up
    #[inline]
    pub fn ray(&self, u: f32, v: f32) -> (f32, f32) {
        ((u - self.cx) / self.fx, (self.cy - v) / self.fy)
    }

    /// Project a camera-space point (z > 0) to pixel coordinates
    #[inline]
    pub fn project(&self, x: f32, y: f32, z: f32) -> (f32, f32) {
        (self.fx * x / z + self.cx, self.cy - self.fy * y / z)
    }
}

/// Rigid transform from depth-camera space to color-camera space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    /// Row-major 3x3 rotation
    pub rotation: [[f32; 3]; 3],
    /// Translation in meters
    pub translation: [f32; 3],
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [-kinect::BASELINE_M, 0.0, 0.0],
        }
    }
}

impl Extrinsics {
    /// Depth-camera point to color-camera point
    #[inline]
    pub fn apply(&self, p: [f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2] + t[0],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2] + t[1],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2] + t[2],
        ]
    }

    /// Color-camera point back to depth-camera point
    #[inline]
    pub fn apply_inverse(&self, p: [f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        let d = [
            p[0] - self.translation[0],
            p[1] - self.translation[1],
            p[2] - self.translation[2],
        ];
        // R^T * (p - t)
        [
            r[0][0] * d[0] + r[1][0] * d[1] + r[2][0] * d[2],
            r[0][1] * d[0] + r[1][1] * d[1] + r[2][1] * d[2],
            r[0][2] * d[0] + r[1][2] * d[1] + r[2][2] * d[2],
        ]
    }
}

/// Full depth + color calibration of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub depth: CameraIntrinsics,
    pub color: CameraIntrinsics,
    pub depth_to_color: Extrinsics,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            depth: CameraIntrinsics::kinect_depth(),
            color: CameraIntrinsics::kinect_color(),
            depth_to_color: Extrinsics::default(),
        }
    }
}
