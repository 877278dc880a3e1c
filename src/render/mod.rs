// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud and image presentation
//!
//! Rasterizes meshes through an [`OrbitCamera`] into a [`Canvas`]; the
//! terminal shell turns the canvas into half-block cells.

mod camera;
mod canvas;

pub use camera::OrbitCamera;
pub use canvas::Canvas;

use crate::mapping::PointCloudMesh;
use image::Rgba;

/// Draw every finite vertex of `mesh` as one pixel
///
/// Positions are multiplied by `scale` before projection. Vertices without
/// a color use `default_color`. Returns the number of pixels written.
pub fn draw_mesh(
    canvas: &mut Canvas,
    camera: &OrbitCamera,
    mesh: &PointCloudMesh,
    scale: f32,
    default_color: Rgba<u8>,
) -> usize {
    let (width, height) = (canvas.width(), canvas.height());
    let colors = mesh.colors();
    let mut drawn = 0;

    for (i, point) in mesh.vertices().iter().enumerate() {
        if !point.is_valid() {
            continue;
        }
        let world = [point.x * scale, point.y * scale, point.z * scale];
        let Some((sx, sy, depth)) = camera.project(world, width, height) else {
            continue;
        };
        let color = colors.get(i).copied().unwrap_or(default_color);
        if canvas.plot(sx.floor() as i64, sy.floor() as i64, depth, color) {
            drawn += 1;
        }
    }

    drawn
}
