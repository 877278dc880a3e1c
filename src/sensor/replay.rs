// SPDX-License-Identifier: GPL-3.0-only

//! Still-capture replay sensor
//!
//! Loads one depth frame (16-bit grayscale PNG, millimeters) and one color
//! image from disk and republishes them every frame interval, so captures
//! from a real sensor can be explored without the hardware.

use super::calibration::Calibration;
use super::pinhole::PinholeMapper;
use super::types::{ColorPixels, DepthPixels};
use super::{CoordinateMapper, SensorDevice};
use crate::errors::{SensorError, SensorResult};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sensor replaying a captured depth + color pair
pub struct ReplayDevice {
    captured_depth: DepthPixels,
    captured_color: ColorPixels,
    mapper: PinholeMapper,
    frame_interval: Option<Duration>,
    is_open: bool,
    depth_enabled: bool,
    color_enabled: bool,
    depth: DepthPixels,
    color: ColorPixels,
    frame_new: bool,
    last_frame: Option<Instant>,
}

impl ReplayDevice {
    /// Load the capture and build a mapper for its frame sizes
    pub fn load(
        depth_path: impl AsRef<Path>,
        color_path: impl AsRef<Path>,
        frame_interval: Option<Duration>,
        calibration: &Calibration,
    ) -> SensorResult<Self> {
        let depth_path = depth_path.as_ref();
        let color_path = color_path.as_ref();

        let captured_depth = image::open(depth_path)
            .map_err(|e| SensorError::Load(format!("{}: {}", depth_path.display(), e)))?
            .into_luma16();
        let captured_color = image::open(color_path)
            .map_err(|e| SensorError::Load(format!("{}: {}", color_path.display(), e)))?
            .into_rgba8();

        let (dw, dh) = captured_depth.dimensions();
        let (cw, ch) = captured_color.dimensions();
        if dw == 0 || dh == 0 || cw == 0 || ch == 0 {
            return Err(SensorError::Load("capture has an empty frame".to_string()));
        }

        info!(
            depth = %depth_path.display(),
            color = %color_path.display(),
            depth_width = dw,
            depth_height = dh,
            color_width = cw,
            color_height = ch,
            "Loaded replay capture"
        );

        Ok(Self {
            mapper: PinholeMapper::new(calibration, dw, dh, cw, ch),
            captured_depth,
            captured_color,
            frame_interval,
            is_open: false,
            depth_enabled: false,
            color_enabled: false,
            depth: DepthPixels::new(0, 0),
            color: ColorPixels::new(0, 0),
            frame_new: false,
            last_frame: None,
        })
    }
}

impl SensorDevice for ReplayDevice {
    fn name(&self) -> &str {
        "Replay capture"
    }

    fn open(&mut self) -> SensorResult<()> {
        self.is_open = true;
        Ok(())
    }

    fn init_depth_source(&mut self) -> SensorResult<()> {
        if !self.is_open {
            return Err(SensorError::NotOpen);
        }
        self.depth_enabled = true;
        Ok(())
    }

    fn init_color_source(&mut self) -> SensorResult<()> {
        if !self.is_open {
            return Err(SensorError::NotOpen);
        }
        self.color_enabled = true;
        Ok(())
    }

    fn update(&mut self) -> SensorResult<()> {
        self.frame_new = false;
        if !self.depth_enabled && !self.color_enabled {
            return Ok(());
        }

        let now = Instant::now();
        if let (Some(interval), Some(last)) = (self.frame_interval, self.last_frame)
            && now.duration_since(last) < interval
        {
            return Ok(());
        }

        if self.depth_enabled {
            self.depth.clone_from(&self.captured_depth);
        }
        if self.color_enabled {
            self.color.clone_from(&self.captured_color);
        }
        self.last_frame = Some(now);
        self.frame_new = true;
        debug!("Replay frame published");
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
