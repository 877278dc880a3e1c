// SPDX-License-Identifier: GPL-3.0-only

//! Orbit camera for the 3D point cloud view

use crate::constants::DEFAULT_WORLD_SCALE;
use crate::constants::camera::{DISTANCE, FOV_Y, NEAR, PITCH_LIMIT, TARGET_DEPTH_M};

type Vec3 = [f32; 3];

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: Vec3) -> Vec3 {
    let len = dot(v, v).sqrt();
    if len <= f32::EPSILON {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Camera orbiting a target point at a fixed distance
///
/// Yaw 0 and pitch 0 look straight along +z, the sensor's viewing
/// direction, so the default view matches what the sensor sees.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    fov_y: f32,
    home_target: Vec3,
    home_distance: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: FOV_Y,
            home_target: target,
            home_distance: distance,
        }
    }

    /// Default view of a scene drawn at `world_scale` units per meter
    pub fn for_world_scale(world_scale: f32) -> Self {
        Self::new(
            [0.0, 0.0, TARGET_DEPTH_M * world_scale],
            DISTANCE * world_scale / DEFAULT_WORLD_SCALE,
        )
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rotate around the target; pitch stops short of the poles
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move towards (factor > 1) or away from (factor < 1) the target
    pub fn zoom(&mut self, factor: f32) {
        if factor <= 0.0 {
            return;
        }
        self.distance = (self.distance / factor).max(NEAR * 2.0);
    }

    /// Restore the initial view
    pub fn reset(&mut self) {
        self.target = self.home_target;
        self.distance = self.home_distance;
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        [cp * sy, sp, cp * cy]
    }

    pub fn eye(&self) -> Vec3 {
        let f = self.forward();
        [
            self.target[0] - f[0] * self.distance,
            self.target[1] - f[1] * self.distance,
            self.target[2] - f[2] * self.distance,
        ]
    }

    /// Project a world point onto a `width`×`height` viewport
    ///
    /// Returns screen x, screen y (y down) and view depth, or `None` when the
    /// point is behind the near plane.
    pub fn project(&self, point: Vec3, width: u32, height: u32) -> Option<(f32, f32, f32)> {
        let f = self.forward();
        let right = normalize(cross([0.0, 1.0, 0.0], f));
        let up = cross(f, right);

        let eye = self.eye();
        let d = [point[0] - eye[0], point[1] - eye[1], point[2] - eye[2]];
        let z = dot(d, f);
        if z < NEAR {
            return None;
        }

        let focal = height as f32 * 0.5 / (self.fov_y * 0.5).tan();
        let sx = width as f32 * 0.5 + dot(d, right) * focal / z;
        let sy = height as f32 * 0.5 - dot(d, up) * focal / z;
        Some((sx, sy, z))
    }
}
