// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the frame mapper

use depth_mapping::constants::SENTINEL_COLOR;
use depth_mapping::errors::{MappingError, MappingResult};
use depth_mapping::mapping::{FrameMapper, MapOutcome, MappingMode};
use depth_mapping::sensor::{
    CameraSpacePoint, ColorPixels, ColorSpacePoint, CoordinateMapper, DepthPixels, PointF,
};
use image::{Luma, Rgb, Rgba};

/// Scripted coordinate mapper
///
/// Depth-frame points are `(index, depth, 1)`, color-frame points come from
/// `color_cloud` and color coordinates from `coords`.
struct FakeMapper {
    depth_len: usize,
    color_cloud: Vec<CameraSpacePoint>,
    coords: Vec<ColorSpacePoint>,
    table: Vec<PointF>,
}

impl FakeMapper {
    fn new(depth_len: usize) -> Self {
        Self {
            depth_len,
            color_cloud: Vec::new(),
            coords: vec![ColorSpacePoint::new(0.0, 0.0); depth_len],
            table: (0..depth_len)
                .map(|i| PointF::new(i as f32 * 0.25 - 1.0, 0.5 - i as f32 * 0.125))
                .collect(),
        }
    }
}

impl CoordinateMapper for FakeMapper {
    fn map_depth_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len, depth.len())?;
        MappingError::check("camera space output", self.depth_len, out.len())?;
        for (i, (&d, slot)) in depth.iter().zip(out.iter_mut()).enumerate() {
            *slot = CameraSpacePoint::new(i as f32, d as f32, 1.0);
        }
        Ok(())
    }

    fn map_color_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len, depth.len())?;
        MappingError::check("camera space output", self.color_cloud.len(), out.len())?;
        out.copy_from_slice(&self.color_cloud);
        Ok(())
    }

    fn map_depth_frame_to_color_space(
        &self,
        depth: &[u16],
        out: &mut [ColorSpacePoint],
    ) -> MappingResult<()> {
        MappingError::check("depth frame", self.depth_len, depth.len())?;
        MappingError::check("color space output", self.depth_len, out.len())?;
        out.copy_from_slice(&self.coords);
        Ok(())
    }

    fn depth_frame_to_camera_space_table(&self) -> MappingResult<Vec<PointF>> {
        Ok(self.table.clone())
    }
}

fn depth_frame(width: u32, height: u32) -> DepthPixels {
    DepthPixels::from_fn(width, height, |x, y| Luma([500 + (y * width + x) as u16 * 250]))
}

/// Color frame where every pixel is distinct
fn color_frame(width: u32, height: u32) -> ColorPixels {
    ColorPixels::from_fn(width, height, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 99, 255]))
}

fn cloud(len: usize, offset: f32) -> Vec<CameraSpacePoint> {
    (0..len)
        .map(|i| CameraSpacePoint::new(i as f32 + offset, -(i as f32) + offset, 2.0 + offset))
        .collect()
}

/// Coordinates for a 3x2 depth frame against a 4x4 color frame
fn mixed_coords() -> Vec<ColorSpacePoint> {
    vec![
        ColorSpacePoint::new(1.5, 2.2),  // inside: (1, 2)
        ColorSpacePoint::new(-1.0, 0.0), // left of frame
        ColorSpacePoint::new(4.0, 0.0),  // right edge is exclusive
        ColorSpacePoint::INVALID,        // unmapped depth
        ColorSpacePoint::new(0.0, 3.99), // inside: (0, 3)
        ColorSpacePoint::new(3.0, 4.5),  // below frame
    ]
}

fn expected_mixed_colors() -> Vec<Rgba<u8>> {
    vec![
        Rgba([10, 20, 99, 255]),
        SENTINEL_COLOR,
        SENTINEL_COLOR,
        SENTINEL_COLOR,
        Rgba([0, 30, 99, 255]),
        SENTINEL_COLOR,
    ]
}

#[test]
fn test_depth_frame_sentinel_and_exact_samples() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.coords = mixed_coords();

    let mut frame_mapper = FrameMapper::new(MappingMode::DepthFrame, 0.5);
    let outcome = frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 6,
            smoothed: false
        }
    );

    let mesh = frame_mapper.mesh();
    assert_eq!(mesh.colors(), expected_mixed_colors().as_slice());
    for (i, p) in mesh.vertices().iter().enumerate() {
        let d = depth.as_raw()[i];
        assert_eq!(*p, CameraSpacePoint::new(i as f32, d as f32, 1.0));
    }
}

#[test]
fn test_registered_image_sentinel_and_exact_samples() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.coords = mixed_coords();

    let mut frame_mapper = FrameMapper::new(MappingMode::RegisteredImage, 0.5);
    let outcome = frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
    assert_eq!(
        outcome,
        MapOutcome::Image {
            width: 3,
            height: 2
        }
    );

    let image = frame_mapper.registered_image().unwrap();
    assert_eq!(image.dimensions(), (3, 2));
    for (i, expected) in expected_mixed_colors().iter().enumerate() {
        let (x, y) = (i as u32 % 3, i as u32 / 3);
        let Rgba([r, g, b, _]) = *expected;
        assert_eq!(image.get_pixel(x, y), &Rgb([r, g, b]), "pixel {}", i);
    }
}

#[test]
fn test_color_frame_first_pass_copies_mapping() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.color_cloud = cloud(16, 0.0);

    let mut frame_mapper = FrameMapper::new(MappingMode::ColorFrame, 0.5);
    let outcome = frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 16,
            smoothed: false
        }
    );
    assert_eq!(frame_mapper.mesh().vertices(), mapper.color_cloud.as_slice());

    // Colors are the color frame in row-major order
    for (i, c) in frame_mapper.mesh().colors().iter().enumerate() {
        let (x, y) = (i as u32 % 4, i as u32 / 4);
        assert_eq!(c, color.get_pixel(x, y));
    }
}

#[test]
fn test_color_frame_smooths_matching_frames() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut first = FakeMapper::new(6);
    first.color_cloud = cloud(16, 0.0);
    let mut second = FakeMapper::new(6);
    second.color_cloud = cloud(16, 3.0);

    let mut frame_mapper = FrameMapper::new(MappingMode::ColorFrame, 0.5);
    frame_mapper.map_frame(&depth, &color, &first).unwrap();
    let outcome = frame_mapper.map_frame(&depth, &color, &second).unwrap();
    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 16,
            smoothed: true
        }
    );

    for ((p, old), new) in frame_mapper
        .mesh()
        .vertices()
        .iter()
        .zip(&first.color_cloud)
        .zip(&second.color_cloud)
    {
        assert_eq!(p.x, old.x * 0.5 + new.x * 0.5);
        assert_eq!(p.y, old.y * 0.5 + new.y * 0.5);
        assert_eq!(p.z, old.z * 0.5 + new.z * 0.5);
    }
}

#[test]
fn test_color_frame_size_change_rebuilds() {
    let depth = depth_frame(3, 2);
    let mut small = FakeMapper::new(6);
    small.color_cloud = cloud(16, 0.0);
    let mut large = FakeMapper::new(6);
    large.color_cloud = cloud(24, 5.0);

    let mut frame_mapper = FrameMapper::new(MappingMode::ColorFrame, 0.5);
    frame_mapper
        .map_frame(&depth, &color_frame(4, 4), &small)
        .unwrap();
    let outcome = frame_mapper
        .map_frame(&depth, &color_frame(6, 4), &large)
        .unwrap();

    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 24,
            smoothed: false
        }
    );
    assert_eq!(frame_mapper.mesh().vertices(), large.color_cloud.as_slice());
    assert_eq!(frame_mapper.mesh().num_colors(), 24);
}

#[test]
fn test_depth_table_positions() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mapper = FakeMapper::new(6);

    let mut frame_mapper = FrameMapper::new(MappingMode::DepthTable, 0.5);
    frame_mapper.map_frame(&depth, &color, &mapper).unwrap();

    let mesh = frame_mapper.mesh();
    assert_eq!(mesh.num_vertices(), 6);
    assert!(!mesh.has_colors());
    for ((p, ray), &d) in mesh
        .vertices()
        .iter()
        .zip(&mapper.table)
        .zip(depth.as_raw())
    {
        let z = d as f32 / 1000.0;
        assert_eq!(*p, CameraSpacePoint::new(ray.x * z, ray.y * z, z));
    }
}

#[test]
fn test_every_mode_key_clears_mesh() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mapper = FakeMapper::new(6);

    for key in ['1', '2', '3', '4', '5'] {
        let mut frame_mapper = FrameMapper::new(MappingMode::DepthFrame, 0.5);
        frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
        assert!(!frame_mapper.mesh().is_empty());

        assert!(frame_mapper.handle_key(key).is_some());
        assert!(frame_mapper.mesh().is_empty(), "key {}", key);
    }
}

#[test]
fn test_reselecting_color_frame_restarts_smoothing() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut first = FakeMapper::new(6);
    first.color_cloud = cloud(16, 0.0);
    let mut second = FakeMapper::new(6);
    second.color_cloud = cloud(16, 3.0);

    let mut frame_mapper = FrameMapper::new(MappingMode::ColorFrame, 0.5);
    frame_mapper.map_frame(&depth, &color, &first).unwrap();
    frame_mapper.handle_key('2');
    let outcome = frame_mapper.map_frame(&depth, &color, &second).unwrap();

    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 16,
            smoothed: false
        }
    );
    assert_eq!(frame_mapper.mesh().vertices(), second.color_cloud.as_slice());
}

#[test]
fn test_zero_width_source_mutates_nothing() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.coords = mixed_coords();
    mapper.color_cloud = cloud(16, 0.0);

    for mode in MappingMode::ALL {
        let mut frame_mapper = FrameMapper::new(mode, 0.5);
        frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
        let mesh_before = frame_mapper.mesh().clone();
        let image_before = frame_mapper.registered_image().cloned();

        let empty_depth = DepthPixels::new(0, 0);
        let empty_color = ColorPixels::new(0, 0);
        assert_eq!(
            frame_mapper
                .map_frame(&empty_depth, &color, &mapper)
                .unwrap(),
            MapOutcome::Skipped
        );
        assert_eq!(
            frame_mapper
                .map_frame(&depth, &empty_color, &mapper)
                .unwrap(),
            MapOutcome::Skipped
        );

        assert_eq!(frame_mapper.mesh(), &mesh_before, "{}", mode);
        assert_eq!(frame_mapper.registered_image(), image_before.as_ref());
    }
}

#[test]
fn test_colored_passes_keep_counts_aligned() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.coords = mixed_coords();
    mapper.color_cloud = cloud(16, 1.0);

    for mode in [MappingMode::ColorFrame, MappingMode::DepthFrame] {
        let mut frame_mapper = FrameMapper::new(mode, 0.5);
        for _ in 0..3 {
            frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
            let mesh = frame_mapper.mesh();
            assert_eq!(mesh.num_vertices(), mesh.num_colors(), "{}", mode);
        }
    }
}

#[test]
fn test_world_auto_is_delegated() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mapper = FakeMapper::new(6);

    let mut frame_mapper = FrameMapper::default();
    assert_eq!(
        frame_mapper.map_frame(&depth, &color, &mapper).unwrap(),
        MapOutcome::Delegated
    );
    assert!(frame_mapper.mesh().is_empty());
}

#[test]
fn test_mapper_errors_propagate() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mapper = FakeMapper::new(5);

    let mut frame_mapper = FrameMapper::new(MappingMode::DepthFrame, 0.5);
    let err = frame_mapper
        .map_frame(&depth, &color, &mapper)
        .unwrap_err();
    assert!(matches!(err, MappingError::SizeMismatch { .. }));
}

/// Mapper whose depth-to-color mapping always fails
struct BrokenColorSpace(FakeMapper);

impl CoordinateMapper for BrokenColorSpace {
    fn map_depth_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        self.0.map_depth_frame_to_camera_space(depth, out)
    }

    fn map_color_frame_to_camera_space(
        &self,
        depth: &[u16],
        out: &mut [CameraSpacePoint],
    ) -> MappingResult<()> {
        self.0.map_color_frame_to_camera_space(depth, out)
    }

    fn map_depth_frame_to_color_space(
        &self,
        depth: &[u16],
        _out: &mut [ColorSpacePoint],
    ) -> MappingResult<()> {
        Err(MappingError::SizeMismatch {
            what: "color space output",
            expected: 0,
            actual: depth.len(),
        })
    }

    fn depth_frame_to_camera_space_table(&self) -> MappingResult<Vec<PointF>> {
        self.0.depth_frame_to_camera_space_table()
    }
}

#[test]
fn test_depth_frame_error_keeps_previous_mesh() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.coords = mixed_coords();

    let mut frame_mapper = FrameMapper::new(MappingMode::DepthFrame, 0.5);
    frame_mapper.map_frame(&depth, &color, &mapper).unwrap();
    let before = frame_mapper.mesh().clone();

    let broken = BrokenColorSpace(FakeMapper::new(6));
    assert!(frame_mapper.map_frame(&depth, &color, &broken).is_err());

    let mesh = frame_mapper.mesh();
    assert_eq!(mesh, &before);
    assert_eq!(mesh.num_vertices(), mesh.num_colors());
}

#[test]
fn test_color_frame_error_does_not_seed_smoothing() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut wrong_size = FakeMapper::new(6);
    wrong_size.color_cloud = cloud(15, 0.0);
    let mut good = FakeMapper::new(6);
    good.color_cloud = cloud(16, 2.0);

    let mut frame_mapper = FrameMapper::new(MappingMode::ColorFrame, 0.5);
    assert!(frame_mapper.map_frame(&depth, &color, &wrong_size).is_err());
    assert!(frame_mapper.mesh().is_empty());
    assert_eq!(frame_mapper.mesh().num_colors(), 0);

    let outcome = frame_mapper.map_frame(&depth, &color, &good).unwrap();
    assert_eq!(
        outcome,
        MapOutcome::Mesh {
            vertices: 16,
            smoothed: false
        }
    );
    assert_eq!(frame_mapper.mesh().vertices(), good.color_cloud.as_slice());
}

#[test]
fn test_short_depth_table_is_rejected() {
    let depth = depth_frame(3, 2);
    let color = color_frame(4, 4);
    let mut mapper = FakeMapper::new(6);
    mapper.table.truncate(4);

    let mut frame_mapper = FrameMapper::new(MappingMode::DepthTable, 0.5);
    let err = frame_mapper
        .map_frame(&depth, &color, &mapper)
        .unwrap_err();
    assert_eq!(
        err,
        MappingError::SizeMismatch {
            what: "depth table",
            expected: 6,
            actual: 4
        }
    );
    assert!(frame_mapper.mesh().is_empty());
}
