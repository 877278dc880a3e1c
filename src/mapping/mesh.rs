// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud mesh: positions with an optional parallel color list

use crate::sensor::CameraSpacePoint;
use image::Rgba;

/// An unconnected set of 3D points
///
/// `colors` is either empty (uncolored cloud) or index-aligned with
/// `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudMesh {
    vertices: Vec<CameraSpacePoint>,
    colors: Vec<Rgba<u8>>,
}

impl PointCloudMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all vertices and colors
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.colors.clear();
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn vertices(&self) -> &[CameraSpacePoint] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut Vec<CameraSpacePoint> {
        &mut self.vertices
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut Vec<Rgba<u8>> {
        &mut self.colors
    }

    /// Append a colored vertex
    pub fn add_vertex(&mut self, position: CameraSpacePoint, color: Rgba<u8>) {
        self.vertices.push(position);
        self.colors.push(color);
    }

    /// Append an uncolored vertex
    pub fn add_position(&mut self, position: CameraSpacePoint) {
        self.vertices.push(position);
    }

    /// Vertex positions as a flat `[x, y, z, x, y, z, ...]` slice
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Axis-aligned bounds of the valid vertices, as (min, max)
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        let mut any = false;

        for p in self.positions_flat().chunks_exact(3) {
            if !p.iter().all(|v| v.is_finite()) {
                continue;
            }
            any = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        any.then_some((min, max))
    }

    /// Number of vertices with finite coordinates
    pub fn valid_count(&self) -> usize {
        self.vertices.iter().filter(|p| p.is_valid()).count()
    }
}
