// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame depth/color mapping
//!
//! The [`FrameMapper`] turns the newest depth and color frames into either a
//! point cloud mesh or a registered image, depending on the active
//! [`MappingMode`]. All projection work is delegated to the sensor's
//! [`CoordinateMapper`]; this module only copies, samples and blends.

mod mesh;

pub use mesh::PointCloudMesh;

use crate::constants::{DEFAULT_SMOOTHING, MM_PER_METER, SENTINEL_COLOR, keys};
use crate::errors::{MappingError, MappingResult};
use crate::sensor::{CameraSpacePoint, ColorPixels, ColorSpacePoint, CoordinateMapper, DepthPixels};
use image::{Rgb, RgbImage, Rgba};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Visualization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MappingMode {
    /// The sensor's own combined point cloud
    #[default]
    WorldAuto,
    /// One camera-space point per color pixel, temporally smoothed
    ColorFrame,
    /// One camera-space point per depth pixel, colored via color-space mapping
    DepthFrame,
    /// One point per depth pixel computed from the depth ray table
    DepthTable,
    /// Color image resampled onto the depth pixel grid
    RegisteredImage,
}

impl MappingMode {
    /// All modes in key order
    pub const ALL: [MappingMode; 5] = [
        MappingMode::WorldAuto,
        MappingMode::ColorFrame,
        MappingMode::DepthFrame,
        MappingMode::DepthTable,
        MappingMode::RegisteredImage,
    ];

    /// Mode selected by a key press; any other key is ignored
    pub fn from_key(key: char) -> Option<Self> {
        keys::MODE_KEYS
            .iter()
            .position(|&k| k == key)
            .map(|i| Self::ALL[i])
    }

    /// Key that selects this mode
    pub fn key(&self) -> char {
        keys::MODE_KEYS[*self as usize]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MappingMode::WorldAuto => "World Auto",
            MappingMode::ColorFrame => "Color Frame",
            MappingMode::DepthFrame => "Depth Frame",
            MappingMode::DepthTable => "Depth Table",
            MappingMode::RegisteredImage => "Registered Image",
        }
    }

    /// Whether the mode renders a registered image instead of a 3D view
    pub fn is_image(&self) -> bool {
        matches!(self, MappingMode::RegisteredImage)
    }
}

impl std::fmt::Display for MappingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What a mapping pass produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    /// A source had no frame yet; nothing was touched
    Skipped,
    /// The sensor draws its own cloud in this mode
    Delegated,
    /// The mesh was rebuilt or smoothed
    Mesh { vertices: usize, smoothed: bool },
    /// The registered image was replaced
    Image { width: u32, height: u32 },
}

impl std::fmt::Display for MapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapOutcome::Skipped => write!(f, "skipped, waiting for frames"),
            MapOutcome::Delegated => write!(f, "sensor point cloud"),
            MapOutcome::Mesh {
                vertices,
                smoothed: true,
            } => write!(f, "{} vertices (smoothed)", vertices),
            MapOutcome::Mesh { vertices, .. } => write!(f, "{} vertices", vertices),
            MapOutcome::Image { width, height } => write!(f, "{}x{} image", width, height),
        }
    }
}

/// Mode state plus the mesh and registered image it produces
#[derive(Debug, Clone)]
pub struct FrameMapper {
    mode: MappingMode,
    mesh: PointCloudMesh,
    image: Option<RgbImage>,
    /// Weight of the previous positions in color-frame smoothing
    smoothing: f32,
    // Reused per-frame buffers
    scratch_points: Vec<CameraSpacePoint>,
    scratch_coords: Vec<ColorSpacePoint>,
}

impl Default for FrameMapper {
    fn default() -> Self {
        Self::new(MappingMode::default(), DEFAULT_SMOOTHING)
    }
}

impl FrameMapper {
    pub fn new(mode: MappingMode, smoothing: f32) -> Self {
        Self {
            mode,
            mesh: PointCloudMesh::new(),
            image: None,
            smoothing: smoothing.clamp(0.0, 1.0),
            scratch_points: Vec::new(),
            scratch_coords: Vec::new(),
        }
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    pub fn mesh(&self) -> &PointCloudMesh {
        &self.mesh
    }

    pub fn registered_image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Switch mode and drop the previous mesh, even if the mode is unchanged
    pub fn set_mode(&mut self, mode: MappingMode) {
        debug!(from = %self.mode, to = %mode, "Switching mapping mode");
        self.mode = mode;
        self.mesh.clear();
    }

    /// Apply a key press; returns the new mode if the key selects one
    pub fn handle_key(&mut self, key: char) -> Option<MappingMode> {
        let mode = MappingMode::from_key(key)?;
        self.set_mode(mode);
        Some(mode)
    }

    /// Run one mapping pass for the active mode
    pub fn map_frame(
        &mut self,
        depth: &DepthPixels,
        color: &ColorPixels,
        mapper: &dyn CoordinateMapper,
    ) -> MappingResult<MapOutcome> {
        if depth.width() == 0 || color.width() == 0 {
            return Ok(MapOutcome::Skipped);
        }

        let outcome = match self.mode {
            MappingMode::WorldAuto => MapOutcome::Delegated,
            MappingMode::ColorFrame => self.map_color_frame(depth, color, mapper)?,
            MappingMode::DepthFrame => self.map_depth_frame(depth, color, mapper)?,
            MappingMode::DepthTable => self.map_depth_table(depth, mapper)?,
            MappingMode::RegisteredImage => self.map_registered_image(depth, color, mapper)?,
        };

        debug!(mode = %self.mode, ?outcome, "Mapped frame");
        Ok(outcome)
    }

    fn map_color_frame(
        &mut self,
        depth: &DepthPixels,
        color: &ColorPixels,
        mapper: &dyn CoordinateMapper,
    ) -> MappingResult<MapOutcome> {
        let color_size = (color.width() * color.height()) as usize;
        self.scratch_points
            .resize(color_size, CameraSpacePoint::default());
        mapper.map_color_frame_to_camera_space(depth.as_raw(), &mut self.scratch_points)?;

        let smoothed = self.mesh.num_vertices() == color_size;
        if smoothed {
            let keep = self.smoothing;
            for (old, new) in self
                .mesh
                .vertices_mut()
                .iter_mut()
                .zip(&self.scratch_points)
            {
                *old = old.blend(new, keep);
            }
        } else {
            self.mesh.clear();
            self.mesh
                .vertices_mut()
                .extend_from_slice(&self.scratch_points);
        }

        let colors = self.mesh.colors_mut();
        colors.clear();
        colors.extend(color.pixels().copied());

        Ok(MapOutcome::Mesh {
            vertices: self.mesh.num_vertices(),
            smoothed,
        })
    }

    fn map_depth_frame(
        &mut self,
        depth: &DepthPixels,
        color: &ColorPixels,
        mapper: &dyn CoordinateMapper,
    ) -> MappingResult<MapOutcome> {
        let frame_size = depth.as_raw().len();
        self.scratch_points
            .resize(frame_size, CameraSpacePoint::default());
        mapper.map_depth_frame_to_camera_space(depth.as_raw(), &mut self.scratch_points)?;
        self.scratch_coords
            .resize(frame_size, ColorSpacePoint::default());
        mapper.map_depth_frame_to_color_space(depth.as_raw(), &mut self.scratch_coords)?;

        // Both mapper calls succeeded; only now replace the mesh
        self.mesh.clear();
        self.mesh
            .vertices_mut()
            .extend_from_slice(&self.scratch_points);
        let colors = self.mesh.colors_mut();
        colors.extend(
            self.scratch_coords
                .iter()
                .map(|coord| sample_or_sentinel(color, coord)),
        );

        Ok(MapOutcome::Mesh {
            vertices: self.mesh.num_vertices(),
            smoothed: false,
        })
    }

    fn map_depth_table(
        &mut self,
        depth: &DepthPixels,
        mapper: &dyn CoordinateMapper,
    ) -> MappingResult<MapOutcome> {
        let table = mapper.depth_frame_to_camera_space_table()?;
        MappingError::check("depth table", depth.as_raw().len(), table.len())?;

        self.mesh.clear();
        for (&sample, ray) in depth.as_raw().iter().zip(&table) {
            let z = sample as f32 / MM_PER_METER;
            self.mesh
                .add_position(CameraSpacePoint::new(ray.x * z, ray.y * z, z));
        }

        Ok(MapOutcome::Mesh {
            vertices: self.mesh.num_vertices(),
            smoothed: false,
        })
    }

    fn map_registered_image(
        &mut self,
        depth: &DepthPixels,
        color: &ColorPixels,
        mapper: &dyn CoordinateMapper,
    ) -> MappingResult<MapOutcome> {
        let frame_size = depth.as_raw().len();
        self.scratch_coords
            .resize(frame_size, ColorSpacePoint::default());
        mapper.map_depth_frame_to_color_space(depth.as_raw(), &mut self.scratch_coords)?;

        let (width, height) = depth.dimensions();
        let mut image = RgbImage::new(width, height);
        for (pixel, coord) in image.pixels_mut().zip(&self.scratch_coords) {
            let Rgba([r, g, b, _]) = sample_or_sentinel(color, coord);
            *pixel = Rgb([r, g, b]);
        }
        self.image = Some(image);

        Ok(MapOutcome::Image { width, height })
    }
}

/// Color at a mapped coordinate, or the sentinel when it falls outside
fn sample_or_sentinel(color: &ColorPixels, coord: &ColorSpacePoint) -> Rgba<u8> {
    match coord.pixel_in(color.width(), color.height()) {
        Some((x, y)) => *color.get_pixel(x, y),
        None => SENTINEL_COLOR,
    }
}
