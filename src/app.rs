// SPDX-License-Identifier: GPL-3.0-only

//! Viewer state shared by the terminal shell and the headless stream
//!
//! One [`App`] owns the sensor, the frame mapper and the view. Each loop
//! iteration calls [`App::update`] (poll the device, map a new frame) and
//! [`App::draw`] (rasterize into a [`Canvas`]).

use crate::config::{Config, SourceConfig};
use crate::constants::camera::{ORBIT_STEP, ZOOM_STEP};
use crate::constants::timing::{FPS_SMOOTHING, FRAME_LOG_INTERVAL};
use crate::constants::{DEFAULT_POINT_COLOR, keys};
use crate::errors::AppResult;
use crate::mapping::{FrameMapper, MapOutcome, MappingMode, PointCloudMesh};
use crate::render::{Canvas, OrbitCamera, draw_mesh};
use crate::sensor::{
    ReplayDevice, SensorDevice, SyntheticDevice, SyntheticSettings, frame_interval,
};
use image::Rgba;
use std::time::Instant;
use tracing::{debug, info, warn};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Build, open and start the device described by the config
pub fn create_device(config: &Config) -> AppResult<Box<dyn SensorDevice>> {
    let calibration = config.calibration();
    let mut device: Box<dyn SensorDevice> = match &config.source {
        SourceConfig::Synthetic {
            depth_width,
            depth_height,
            color_width,
            color_height,
            fps,
        } => Box::new(SyntheticDevice::new(SyntheticSettings {
            depth_width: *depth_width,
            depth_height: *depth_height,
            color_width: *color_width,
            color_height: *color_height,
            frame_interval: frame_interval(*fps),
            calibration,
        })),
        SourceConfig::Replay { depth, color, fps } => Box::new(ReplayDevice::load(
            depth,
            color,
            frame_interval(*fps),
            &calibration,
        )?),
    };

    device.open()?;
    device.init_depth_source()?;
    device.init_color_source()?;
    info!(device = device.name(), "Sensor ready");
    Ok(device)
}

/// Exponentially smoothed frame rate
#[derive(Debug, Clone, Default)]
pub struct FrameRate {
    last: Option<Instant>,
    fps: f64,
}

impl FrameRate {
    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant
                } else {
                    self.fps * FPS_SMOOTHING + instant * (1.0 - FPS_SMOOTHING)
                };
            }
        }
        self.last = Some(now);
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Viewer state
pub struct App {
    device: Box<dyn SensorDevice>,
    mapper: FrameMapper,
    camera: OrbitCamera,
    frame_rate: FrameRate,
    world_scale: f32,
    /// The sensor's own cloud, refreshed on new frames in World Auto mode
    world_mesh: PointCloudMesh,
    frames_mapped: u64,
}

impl App {
    pub fn new(device: Box<dyn SensorDevice>, config: &Config) -> Self {
        info!(mode = %config.initial_mode, "Starting viewer");
        Self {
            device,
            mapper: FrameMapper::new(config.initial_mode, config.smoothing),
            camera: OrbitCamera::for_world_scale(config.world_scale),
            frame_rate: FrameRate::default(),
            world_scale: config.world_scale,
            world_mesh: PointCloudMesh::new(),
            frames_mapped: 0,
        }
    }

    pub fn device(&self) -> &dyn SensorDevice {
        self.device.as_ref()
    }

    pub fn mapper(&self) -> &FrameMapper {
        &self.mapper
    }

    pub fn mode(&self) -> MappingMode {
        self.mapper.mode()
    }

    pub fn world_mesh(&self) -> &PointCloudMesh {
        &self.world_mesh
    }

    pub fn frames_mapped(&self) -> u64 {
        self.frames_mapped
    }

    /// Poll the device and map the newest frame
    ///
    /// Returns `None` when no new frame was ready. Mapping failures are
    /// logged and leave the previous output on screen.
    pub fn update(&mut self) -> AppResult<Option<MapOutcome>> {
        self.device.update()?;
        if !self.device.is_frame_new() {
            return Ok(None);
        }

        let result = self.mapper.map_frame(
            self.device.depth_pixels(),
            self.device.color_pixels(),
            self.device.coordinate_mapper(),
        );
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, mode = %self.mapper.mode(), "Frame mapping failed");
                return Ok(None);
            }
        };

        if outcome == MapOutcome::Delegated {
            match self.device.world_mesh() {
                Ok(mesh) => self.world_mesh = mesh,
                Err(e) => warn!(error = %e, "Sensor point cloud failed"),
            }
        }

        self.frames_mapped += 1;
        if self.frames_mapped % FRAME_LOG_INTERVAL == 0 {
            debug!(
                frames = self.frames_mapped,
                fps = self.frame_rate.fps(),
                "Mapping"
            );
        }
        Ok(Some(outcome))
    }

    /// Apply a character key; returns whether it was bound
    pub fn handle_key(&mut self, key: char) -> bool {
        if let Some(mode) = self.mapper.handle_key(key) {
            self.world_mesh.clear();
            info!(mode = %mode, "Mode selected");
            return true;
        }
        match key {
            keys::RESET_VIEW => self.camera.reset(),
            keys::ZOOM_IN | '=' => self.camera.zoom(ZOOM_STEP),
            keys::ZOOM_OUT | '_' => self.camera.zoom(1.0 / ZOOM_STEP),
            _ => return false,
        }
        true
    }

    /// Rotate the view by a number of orbit steps
    pub fn orbit_steps(&mut self, yaw_steps: f32, pitch_steps: f32) {
        self.camera.orbit(yaw_steps * ORBIT_STEP, pitch_steps * ORBIT_STEP);
    }

    /// Rotate the view by radians
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.camera.orbit(d_yaw, d_pitch);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.camera.zoom(factor);
    }

    /// Render the current output into `canvas`
    pub fn draw(&mut self, canvas: &mut Canvas) {
        self.frame_rate.tick(Instant::now());
        canvas.clear(BACKGROUND);

        let mode = self.mapper.mode();
        if mode.is_image() {
            if let Some(image) = self.mapper.registered_image() {
                canvas.blit_image(image);
            }
            return;
        }

        let mesh = match mode {
            MappingMode::WorldAuto => &self.world_mesh,
            _ => self.mapper.mesh(),
        };
        draw_mesh(
            canvas,
            &self.camera,
            mesh,
            self.world_scale,
            DEFAULT_POINT_COLOR,
        );
    }

    /// Frame rate and mode readout, one line each
    pub fn overlay_lines(&self) -> [String; 2] {
        [
            format!("{:.2} FPS", self.frame_rate.fps()),
            format!("Mode: {}", self.mapper.mode().display_name()),
        ]
    }
}
