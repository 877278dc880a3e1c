// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for sensor devices and coordinate mapping

use bytemuck::{Pod, Zeroable};
use image::{ImageBuffer, Luma, RgbaImage};

/// Depth frame: one 16-bit sample per pixel, in millimeters (0 = invalid)
pub type DepthPixels = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Color frame: 8-bit RGBA
pub type ColorPixels = RgbaImage;

/// A point in camera space (meters, centred on the depth sensor, y up)
///
/// Invalid points have every component set to negative infinity.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct CameraSpacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraSpacePoint {
    pub const INVALID: Self = Self {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
        z: f32::NEG_INFINITY,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Check that all components are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise `self * keep + other * (1 - keep)`
    pub fn blend(&self, other: &Self, keep: f32) -> Self {
        let take = 1.0 - keep;
        Self {
            x: self.x * keep + other.x * take,
            y: self.y * keep + other.y * take,
            z: self.z * keep + other.z * take,
        }
    }
}

/// A point in color-image space (pixels)
///
/// Depth samples that cannot be mapped yield negative infinity.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColorSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl ColorSpacePoint {
    pub const INVALID: Self = Self {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
    };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Integer pixel coordinate if this point lies inside a `width`×`height`
    /// image. NaN and infinities are never inside.
    pub fn pixel_in(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.x >= 0.0 && self.x < width as f32 && self.y >= 0.0 && self.y < height as f32 {
            Some((self.x as u32, self.y as u32))
        } else {
            None
        }
    }
}

/// Ray direction entry of the depth-to-camera-space table
///
/// Multiplying by the depth in meters gives the camera-space x and y.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
