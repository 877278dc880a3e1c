// SPDX-License-Identifier: GPL-3.0-only

//! Pinhole coordinate mapper
//!
//! Maps between the depth grid, the color grid and camera space using
//! calibrated pinhole intrinsics for both cameras and a rigid transform
//! between them. Camera space is the depth camera's frame: meters, x right,
//! y up, z forward.

use super::calibration::{Calibration, CameraIntrinsics, Extrinsics};
use super::types::{CameraSpacePoint, ColorSpacePoint, PointF};
use super::CoordinateMapper;
use crate::constants::MM_PER_METER;
use crate::constants::depth::DEPTH_INVALID_MM;
use crate::errors::{MappingError, MappingResult};
use tracing::debug;

/// Coordinate mapper for one pair of depth/color frame sizes
#[derive(Debug, Clone)]
pub struct PinholeMapper {
    depth: CameraIntrinsics,
    color: CameraIntrinsics,
    depth_to_color: Extrinsics,
    depth_width: u32,
    depth_height: u32,
    color_width: u32,
    color_height: u32,
    /// Ray per depth pixel, computed once
    rays: Vec<PointF>,
}

impl PinholeMapper {
    /// Build a mapper for the given frame sizes, scaling the calibration
    pub fn new(
        calibration: &Calibration,
        depth_width: u32,
        depth_height: u32,
        color_width: u32,
        color_height: u32,
    ) -> Self {
        let depth = calibration.depth.scaled_to(depth_width, depth_height);
        let color = calibration.color.scaled_to(color_width, color_height);

        let mut rays = Vec::with_capacity((depth_width * depth_height) as usize);
        for v in 0..depth_height {
            for u in 0..depth_width {
                let (x, y) = depth.ray(u as f32, v as f32);
                rays.push(PointF::new(x, y));
            }
        }

        debug!(
            depth_width,
            depth_height,
            color_width,
            color_height,
            depth_fx = depth.fx,
            color_fx = color.fx,
            "Built pinhole coordinate mapper"
        );

        Self {
            depth,
            color,
            depth_to_color: calibration.depth_to_color,
            depth_width,
            depth_height,
            color_width,
            color_height,
            rays,
        }
    }

    fn depth_len(&self) -> usize {
        (self.depth_width * self.depth_height) as usize
    }

    fn color_len(&self) -> usize {
        (self.color_width * self.color_height) as usize
    }

    /// Camera-space point of depth pixel `index`, or `None` for invalid depth
    #[inline]
    fn unproject(&self, index: usize, depth_mm: u16) -> Option<[f32; 3]> {
        if depth_mm == DEPTH_INVALID_MM {
            return None;
        }
        let z = depth_mm as f32 / MM_PER_METER;
        let ray = self.rays[index];
        Some([ray.x * z, ray.y * z, z])
    }

    /// Color-camera point and its projection for a depth-camera point
    #[inline]
    fn to_color(&self, p: [f32; 3]) -> Option<([f32; 3], ColorSpacePoint)> {
        let c = self.depth_to_color.apply(p);
        if c[2] <= 0.0 {
            return None;
        }
        let (u, v) = self.color.project(c[0], c[1], c[2]);
        Some((c, ColorSpacePoint::new(u, v)))
    }
}

impl CoordinateMapper for PinholeMapper {
    fn map_depth_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len(), depth.len())?;
        MappingError::check("camera space output", self.depth_len(), out.len())?;

        for (i, (&d, slot)) in depth.iter().zip(out.iter_mut()).enumerate() {
            *slot = match self.unproject(i, d) {
                Some([x, y, z]) => CameraSpacePoint::new(x, y, z),
                None => CameraSpacePoint::INVALID,
            };
        }
        Ok(())
    }

    fn map_color_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len(), depth.len())?;
        MappingError::check("camera space output", self.color_len(), out.len())?;

        out.fill(CameraSpacePoint::INVALID);
        let mut nearest = vec![f32::INFINITY; out.len()];

        // Color pixels covered by one depth pixel
        let half_x = (0.5 * self.color.fx / self.depth.fx).max(0.5);
        let half_y = (0.5 * self.color.fy / self.depth.fy).max(0.5);
        let width = self.color_width as i64;
        let height = self.color_height as i64;

        for (i, &d) in depth.iter().enumerate() {
            let Some(p) = self.unproject(i, d) else {
                continue;
            };
            let Some((c, center)) = self.to_color(p) else {
                continue;
            };
            let zc = c[2];

            let x0 = ((center.x - half_x).round() as i64).max(0);
            let x1 = ((center.x + half_x).round() as i64).min(width);
            let y0 = ((center.y - half_y).round() as i64).max(0);
            let y1 = ((center.y + half_y).round() as i64).min(height);

            for cy in y0..y1 {
                for cx in x0..x1 {
                    let idx = (cy * width + cx) as usize;
                    if zc >= nearest[idx] {
                        continue;
                    }
                    nearest[idx] = zc;
                    let (rx, ry) = self.color.ray(cx as f32, cy as f32);
                    let [x, y, z] = self.depth_to_color.apply_inverse([rx * zc, ry * zc, zc]);
                    out[idx] = CameraSpacePoint::new(x, y, z);
                }
            }
        }
        Ok(())
    }

    fn map_depth_frame_to_color_space(
        &self,
        depth: &[u16],
        out: &mut [ColorSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len(), depth.len())?;
        MappingError::check("color space output", self.depth_len(), out.len())?;

        for (i, (&d, slot)) in depth.iter().zip(out.iter_mut()).enumerate() {
            *slot = self
                .unproject(i, d)
                .and_then(|p| self.to_color(p))
                .map(|(_, coord)| coord)
                .unwrap_or(ColorSpacePoint::INVALID);
        }
        Ok(())
    }

    fn depth_frame_to_camera_space_table(&self) -> MappingResult<Vec<PointF>> {
        Ok(self.rays.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_calibration() -> Calibration {
        let k = CameraIntrinsics {
            fx: 4.0,
            fy: 4.0,
            cx: 2.0,
            cy: 2.0,
            base_width: 4,
            base_height: 4,
        };
        Calibration {
            depth: k,
            color: k,
            depth_to_color: Extrinsics {
                rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                translation: [0.0, 0.0, 0.0],
            },
        }
    }

    #[test]
    fn test_depth_to_camera_uses_table() {
        let mapper = PinholeMapper::new(&identity_calibration(), 4, 4, 4, 4);
        let depth = vec![1500u16; 16];
        let mut points = vec![CameraSpacePoint::default(); 16];
        mapper
            .map_depth_frame_to_camera_space(&depth, &mut points)
            .unwrap();

        let table = mapper.depth_frame_to_camera_space_table().unwrap();
        for (p, ray) in points.iter().zip(&table) {
            assert_eq!(p.x, ray.x * 1.5);
            assert_eq!(p.y, ray.y * 1.5);
            assert_eq!(p.z, 1.5);
        }
    }

    #[test]
    fn test_invalid_depth_maps_to_negative_infinity() {
        let mapper = PinholeMapper::new(&identity_calibration(), 4, 4, 4, 4);
        let depth = vec![0u16; 16];
        let mut points = vec![CameraSpacePoint::default(); 16];
        let mut coords = vec![ColorSpacePoint::default(); 16];
        mapper
            .map_depth_frame_to_camera_space(&depth, &mut points)
            .unwrap();
        mapper
            .map_depth_frame_to_color_space(&depth, &mut coords)
            .unwrap();
        assert!(points.iter().all(|p| *p == CameraSpacePoint::INVALID));
        assert!(coords.iter().all(|c| *c == ColorSpacePoint::INVALID));
    }

    #[test]
    fn test_identity_registration_maps_pixel_to_itself() {
        let mapper = PinholeMapper::new(&identity_calibration(), 4, 4, 4, 4);
        let depth = vec![2000u16; 16];
        let mut coords = vec![ColorSpacePoint::default(); 16];
        mapper
            .map_depth_frame_to_color_space(&depth, &mut coords)
            .unwrap();
        for (i, c) in coords.iter().enumerate() {
            let (u, v) = ((i % 4) as f32, (i / 4) as f32);
            assert!((c.x - u).abs() < 1e-4, "x {} vs {}", c.x, u);
            assert!((c.y - v).abs() < 1e-4, "y {} vs {}", c.y, v);
        }
    }

    #[test]
    fn test_baseline_shifts_color_coordinates() {
        let calibration = Calibration::default();
        let mapper = PinholeMapper::new(&calibration, 640, 480, 640, 480);
        let depth = vec![1000u16; 640 * 480];
        let mut coords = vec![ColorSpacePoint::default(); 640 * 480];
        mapper
            .map_depth_frame_to_color_space(&depth, &mut coords)
            .unwrap();

        // Shifted left by baseline * f / z pixels
        let center = (242 * 640 + 339) as usize;
        let c = coords[center];
        let (rx, _) = calibration.depth.ray(339.0, 242.0);
        let expected_u = 525.0 * (rx - 0.025) + 319.5;
        assert!((c.x - expected_u).abs() < 1e-2);
    }

    #[test]
    fn test_color_frame_covers_color_pixels() {
        let mapper = PinholeMapper::new(&identity_calibration(), 4, 4, 4, 4);
        let depth = vec![1000u16; 16];
        let mut points = vec![CameraSpacePoint::default(); 16];
        mapper
            .map_color_frame_to_camera_space(&depth, &mut points)
            .unwrap();
        assert!(points.iter().all(|p| p.is_valid()));
        // With identical cameras the color-frame cloud equals the depth cloud
        let mut direct = vec![CameraSpacePoint::default(); 16];
        mapper
            .map_depth_frame_to_camera_space(&depth, &mut direct)
            .unwrap();
        for (a, b) in points.iter().zip(&direct) {
            assert!((a.x - b.x).abs() < 1e-5);
            assert!((a.y - b.y).abs() < 1e-5);
            assert!((a.z - b.z).abs() < 1e-5);
        }
    }

    #[test]
    fn test_size_mismatch_is_reported() {
        let mapper = PinholeMapper::new(&identity_calibration(), 4, 4, 4, 4);
        let depth = vec![1000u16; 15];
        let mut points = vec![CameraSpacePoint::default(); 16];
        let err = mapper
            .map_depth_frame_to_camera_space(&depth, &mut points)
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::SizeMismatch {
                what: "depth frame",
                expected: 16,
                actual: 15
            }
        );
    }
}
