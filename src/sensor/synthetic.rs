// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth + color sensor
//!
//! Ray-casts a small animated scene (back wall, floor and a sphere moving
//! left and right) from both the depth and the color camera of a
//! [`Calibration`], so the generated frames are exactly consistent with the
//! device's [`PinholeMapper`]. A little deterministic depth noise keeps
//! temporal smoothing visible.

use super::calibration::{Calibration, CameraIntrinsics, Extrinsics};
use super::pinhole::PinholeMapper;
use super::types::{ColorPixels, DepthPixels};
use super::{CoordinateMapper, SensorDevice, frame_interval};
use crate::constants::MM_PER_METER;
use crate::constants::depth::{DEPTH_INVALID_MM, DEPTH_MAX_MM};
use crate::constants::frames;
use crate::errors::{SensorError, SensorResult};
use image::{Luma, Rgba};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Scene layout, in depth-camera space (meters, y up)
mod scene {
    pub const WALL_Z: f32 = 3.5;
    pub const FLOOR_Y: f32 = -0.9;
    pub const SPHERE_RADIUS: f32 = 0.4;
    pub const SPHERE_Y: f32 = -0.3;
    pub const SPHERE_Z: f32 = 2.2;
    /// Horizontal swing of the sphere
    pub const SPHERE_SWING: f32 = 0.8;
    /// Radians of animation phase per frame
    pub const PHASE_STEP: f32 = 0.05;
    /// Peak depth noise in millimeters
    pub const NOISE_MM: i32 = 6;
    /// Floor tile size in meters
    pub const TILE_M: f32 = 0.5;
}

/// Synthetic sensor configuration
#[derive(Debug, Clone)]
pub struct SyntheticSettings {
    pub depth_width: u32,
    pub depth_height: u32,
    pub color_width: u32,
    pub color_height: u32,
    /// Minimum time between frames; `None` publishes on every update
    pub frame_interval: Option<Duration>,
    pub calibration: Calibration,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            depth_width: frames::DEPTH_WIDTH,
            depth_height: frames::DEPTH_HEIGHT,
            color_width: frames::COLOR_WIDTH,
            color_height: frames::COLOR_HEIGHT,
            frame_interval: frame_interval(frames::FPS),
            calibration: Calibration::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Surface {
    Wall,
    Floor,
    Sphere,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    /// Ray parameter; equals the depth when the ray's z component is 1
    t: f32,
    point: [f32; 3],
    surface: Surface,
}

/// Animated ray-cast scene sensor
pub struct SyntheticDevice {
    settings: SyntheticSettings,
    mapper: PinholeMapper,
    depth_intrinsics: CameraIntrinsics,
    color_intrinsics: CameraIntrinsics,
    is_open: bool,
    depth_enabled: bool,
    color_enabled: bool,
    depth: DepthPixels,
    color: ColorPixels,
    frame_new: bool,
    frame_count: u64,
    last_frame: Option<Instant>,
}

impl SyntheticDevice {
    pub fn new(settings: SyntheticSettings) -> Self {
        let calibration = &settings.calibration;
        let mapper = PinholeMapper::new(
            calibration,
            settings.depth_width,
            settings.depth_height,
            settings.color_width,
            settings.color_height,
        );
        let depth_intrinsics = calibration
            .depth
            .scaled_to(settings.depth_width, settings.depth_height);
        let color_intrinsics = calibration
            .color
            .scaled_to(settings.color_width, settings.color_height);

        Self {
            settings,
            mapper,
            depth_intrinsics,
            color_intrinsics,
            is_open: false,
            depth_enabled: false,
            color_enabled: false,
            depth: DepthPixels::new(0, 0),
            color: ColorPixels::new(0, 0),
            frame_new: false,
            frame_count: 0,
            last_frame: None,
        }
    }

    /// Number of frames published so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        match (self.settings.frame_interval, self.last_frame) {
            (Some(interval), Some(last)) => now.duration_since(last) >= interval,
            _ => true,
        }
    }

    fn sphere_center(&self) -> [f32; 3] {
        let phase = self.frame_count as f32 * scene::PHASE_STEP;
        [
            scene::SPHERE_SWING * phase.sin(),
            scene::SPHERE_Y,
            scene::SPHERE_Z,
        ]
    }

    fn render_depth(&mut self, sphere: [f32; 3]) {
        let k = self.depth_intrinsics;
        let (width, height) = (self.settings.depth_width, self.settings.depth_height);
        let frame = self.frame_count;
        let mut depth = DepthPixels::new(width, height);

        for (u, v, pixel) in depth.enumerate_pixels_mut() {
            let (rx, ry) = k.ray(u as f32, v as f32);
            let sample = cast([0.0, 0.0, 0.0], [rx, ry, 1.0], sphere)
                .map(|hit| {
                    let mm = hit.t * MM_PER_METER + noise(u, v, frame) as f32;
                    if mm <= 0.0 || mm > DEPTH_MAX_MM as f32 {
                        DEPTH_INVALID_MM
                    } else {
                        mm.round() as u16
                    }
                })
                .unwrap_or(DEPTH_INVALID_MM);
            *pixel = Luma([sample]);
        }

        self.depth = depth;
    }

    fn render_color(&mut self, sphere: [f32; 3]) {
        let k = self.color_intrinsics;
        let extrinsics = self.settings.calibration.depth_to_color;
        let (width, height) = (self.settings.color_width, self.settings.color_height);
        let origin = extrinsics.apply_inverse([0.0, 0.0, 0.0]);
        let mut color = ColorPixels::new(width, height);

        for (u, v, pixel) in color.enumerate_pixels_mut() {
            let (rx, ry) = k.ray(u as f32, v as f32);
            let direction = rotate_inverse(&extrinsics, [rx, ry, 1.0]);
            *pixel = match cast(origin, direction, sphere) {
                Some(hit) => shade(&hit, sphere),
                None => Rgba([0, 0, 0, 255]),
            };
        }

        self.color = color;
    }
}

impl SensorDevice for SyntheticDevice {
    fn name(&self) -> &str {
        "Synthetic scene"
    }

    fn open(&mut self) -> SensorResult<()> {
        info!(
            depth_width = self.settings.depth_width,
            depth_height = self.settings.depth_height,
            color_width = self.settings.color_width,
            color_height = self.settings.color_height,
            "Opened synthetic sensor"
        );
        self.is_open = true;
        Ok(())
    }

    fn init_depth_source(&mut self) -> SensorResult<()> {
        if !self.is_open {
            return Err(SensorError::NotOpen);
        }
        info!("Synthetic depth source started");
        self.depth_enabled = true;
        Ok(())
    }

    fn init_color_source(&mut self) -> SensorResult<()> {
        if !self.is_open {
            return Err(SensorError::NotOpen);
        }
        info!("Synthetic color source started");
        self.color_enabled = true;
        Ok(())
    }

    fn update(&mut self) -> SensorResult<()> {
        self.frame_new = false;
        if !self.depth_enabled && !self.color_enabled {
            return Ok(());
        }

        let now = Instant::now();
        if !self.interval_elapsed(now) {
            return Ok(());
        }

        let sphere = self.sphere_center();
        if self.depth_enabled {
            self.render_depth(sphere);
        }
        if self.color_enabled {
            self.render_color(sphere);
        }

        self.last_frame = Some(now);
        self.frame_count += 1;
        self.frame_new = true;
        debug!(frame = self.frame_count, "Synthetic frame rendered");
        Ok(())
    }

    fn is_frame_new(&self) -> bool {
        self.frame_new
    }

    fn depth_pixels(&self) -> &DepthPixels {
        &self.depth
    }

    fn color_pixels(&self) -> &ColorPixels {
        &self.color
    }

    fn coordinate_mapper(&self) -> &dyn CoordinateMapper {
        &self.mapper
    }
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Rotate a color-camera direction into depth-camera space
fn rotate_inverse(extrinsics: &Extrinsics, d: [f32; 3]) -> [f32; 3] {
    let origin = extrinsics.apply_inverse([0.0, 0.0, 0.0]);
    sub(extrinsics.apply_inverse(d), origin)
}

/// Nearest scene intersection of the ray `origin + t * direction`
fn cast(origin: [f32; 3], direction: [f32; 3], sphere: [f32; 3]) -> Option<Hit> {
    let mut best: Option<(f32, Surface)> = None;
    let mut consider = |t: f32, surface: Surface| {
        if t > 0.0 && best.is_none_or(|(bt, _)| t < bt) {
            best = Some((t, surface));
        }
    };

    if direction[2] > 0.0 {
        consider((scene::WALL_Z - origin[2]) / direction[2], Surface::Wall);
    }
    if direction[1] < 0.0 {
        consider((scene::FLOOR_Y - origin[1]) / direction[1], Surface::Floor);
    }

    let oc = sub(origin, sphere);
    let a = dot(direction, direction);
    let b = 2.0 * dot(direction, oc);
    let c = dot(oc, oc) - scene::SPHERE_RADIUS * scene::SPHERE_RADIUS;
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        consider((-b - disc.sqrt()) / (2.0 * a), Surface::Sphere);
    }

    best.map(|(t, surface)| Hit {
        t,
        point: [
            origin[0] + t * direction[0],
            origin[1] + t * direction[1],
            origin[2] + t * direction[2],
        ],
        surface,
    })
}

/// Surface color at a hit point
fn shade(hit: &Hit, sphere: [f32; 3]) -> Rgba<u8> {
    let [x, y, z] = hit.point;
    match hit.surface {
        Surface::Wall => {
            // Vertical gradient, blue at the top
            let t = ((y + 1.0) / 3.0).clamp(0.0, 1.0);
            Rgba([
                (90.0 - 40.0 * t) as u8,
                (110.0 - 20.0 * t) as u8,
                (140.0 + 80.0 * t) as u8,
                255,
            ])
        }
        Surface::Floor => {
            let tile = ((x / scene::TILE_M).floor() + (z / scene::TILE_M).floor()) as i64;
            if tile.rem_euclid(2) == 0 {
                Rgba([200, 200, 190, 255])
            } else {
                Rgba([70, 70, 80, 255])
            }
        }
        Surface::Sphere => {
            let n = sub(hit.point, sphere);
            let len = dot(n, n).sqrt().max(f32::EPSILON);
            // Light from the upper left, behind the camera
            let light = [-0.5, 0.6, -0.6];
            let lambert = (dot(n, light) / len).max(0.0);
            let shade = 0.25 + 0.75 * lambert;
            Rgba([
                (250.0 * shade) as u8,
                (140.0 * shade) as u8,
                (40.0 * shade) as u8,
                255,
            ])
        }
    }
}

/// Deterministic per-pixel depth jitter in millimeters
fn noise(u: u32, v: u32, frame: u64) -> i32 {
    let mut h = ((u as u64) << 32) ^ ((v as u64) << 16) ^ frame.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    let span = (2 * scene::NOISE_MM + 1) as u64;
    (h % span) as i32 - scene::NOISE_MM
}
