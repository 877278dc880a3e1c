// SPDX-License-Identifier: GPL-3.0-only

//! Depth + color sensor abstraction
//!
//! A [`SensorDevice`] owns one depth stream and one color stream and exposes
//! a [`CoordinateMapper`] that converts between the depth pixel grid, the
//! color pixel grid and 3D camera space.
//!
//! # Lifecycle
//!
//! ```ignore
//! let mut device = SyntheticDevice::new(SyntheticSettings::default());
//! device.open()?;
//! device.init_depth_source()?;
//! device.init_color_source()?;
//!
//! loop {
//!     device.update()?;
//!     if device.is_frame_new() {
//!         let depth = device.depth_pixels();
//!         let color = device.color_pixels();
//!         // map with device.coordinate_mapper()
//!     }
//! }
//! ```
//!
//! Sources report a zero-sized buffer until their first frame arrives.

pub mod calibration;
pub mod pinhole;
pub mod replay;
pub mod synthetic;
pub mod types;

pub use calibration::{CameraIntrinsics, Calibration, Extrinsics};
pub use pinhole::PinholeMapper;
pub use replay::ReplayDevice;
pub use synthetic::{SyntheticDevice, SyntheticSettings};
pub use types::{CameraSpacePoint, ColorPixels, ColorSpacePoint, DepthPixels, PointF};

use crate::errors::{MappingResult, SensorResult};
use crate::mapping::PointCloudMesh;
use std::time::Duration;

/// Coordinate mapping service of a calibrated depth + color sensor
///
/// Every operation works on whole frames. Output slices must be sized for
/// the frame they describe; mismatches are reported, never truncated.
pub trait CoordinateMapper {
    /// One camera-space point per depth pixel
    fn map_depth_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()>;

    /// One camera-space point per color pixel
    fn map_color_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()>;

    /// One color-image coordinate per depth pixel
    fn map_depth_frame_to_color_space(
        &self,
        depth: &[u16],
        out: &mut [ColorSpacePoint],
    ) -> MappingResult<()>;

    /// Per depth pixel ray directions; `(x * z, y * z, z)` is the camera-space
    /// point for a depth of `z` meters
    fn depth_frame_to_camera_space_table(&self) -> MappingResult<Vec<PointF>>;
}

/// A depth + color sensor
pub trait SensorDevice {
    /// Human readable device name
    fn name(&self) -> &str;

    /// Open the device
    fn open(&mut self) -> SensorResult<()>;

    /// Start the depth stream
    fn init_depth_source(&mut self) -> SensorResult<()>;

    /// Start the color stream
    fn init_color_source(&mut self) -> SensorResult<()>;

    /// Poll the device for new frames
    fn update(&mut self) -> SensorResult<()>;

    /// Whether the last [`update`](Self::update) produced a new frame
    fn is_frame_new(&self) -> bool;

    /// Newest depth frame (zero-sized before the first frame)
    fn depth_pixels(&self) -> &DepthPixels;

    /// Newest color frame (zero-sized before the first frame)
    fn color_pixels(&self) -> &ColorPixels;

    /// The device's coordinate mapper
    fn coordinate_mapper(&self) -> &dyn CoordinateMapper;

    /// The device's own combined point cloud of the newest frames
    ///
    /// Invalid depth samples are dropped and color coordinates are clamped
    /// to the color frame edge.
    fn world_mesh(&self) -> SensorResult<PointCloudMesh> {
        Ok(build_world_mesh(
            self.depth_pixels(),
            self.color_pixels(),
            self.coordinate_mapper(),
        )?)
    }
}

/// Frame interval for a frame rate; zero means publish on every update
pub fn frame_interval(fps: u32) -> Option<Duration> {
    (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64))
}

/// Build a colored point cloud from a depth and color frame
pub fn build_world_mesh(
    depth: &DepthPixels,
    color: &ColorPixels,
    mapper: &dyn CoordinateMapper,
) -> MappingResult<PointCloudMesh> {
    let mut mesh = PointCloudMesh::new();
    if depth.width() == 0 || color.width() == 0 {
        return Ok(mesh);
    }

    let samples = depth.as_raw();
    let mut points = vec![CameraSpacePoint::default(); samples.len()];
    let mut coords = vec![ColorSpacePoint::default(); samples.len()];
    mapper.map_depth_frame_to_camera_space(samples, &mut points)?;
    mapper.map_depth_frame_to_color_space(samples, &mut coords)?;

    let max_x = (color.width() - 1) as f32;
    let max_y = (color.height().max(1) - 1) as f32;
    for (point, coord) in points.iter().zip(&coords) {
        if !point.is_valid() || !coord.x.is_finite() || !coord.y.is_finite() {
            continue;
        }
        let x = coord.x.clamp(0.0, max_x) as u32;
        let y = coord.y.clamp(0.0, max_y) as u32;
        mesh.add_vertex(*point, *color.get_pixel(x, y));
    }

    Ok(mesh)
}
