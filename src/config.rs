// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::app_info::{APP_NAME, CONFIG_FILE};
use crate::constants::{DEFAULT_SMOOTHING, DEFAULT_WORLD_SCALE, frames};
use crate::errors::{AppError, AppResult};
use crate::mapping::MappingMode;
use crate::sensor::Calibration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceConfig {
    /// Animated ray-cast scene
    Synthetic {
        depth_width: u32,
        depth_height: u32,
        color_width: u32,
        color_height: u32,
        /// Frames per second (0 = as fast as the viewer polls)
        fps: u32,
    },
    /// Captured 16-bit depth PNG plus color image
    Replay {
        depth: PathBuf,
        color: PathBuf,
        fps: u32,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Synthetic {
            depth_width: frames::DEPTH_WIDTH,
            depth_height: frames::DEPTH_HEIGHT,
            color_width: frames::COLOR_WIDTH,
            color_height: frames::COLOR_HEIGHT,
            fps: frames::FPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mapping mode active at startup
    pub initial_mode: MappingMode,
    /// Weight of previous positions in color-frame smoothing (0..=1)
    pub smoothing: f32,
    /// Scale from camera-space meters to view units
    pub world_scale: f32,
    /// Frame source
    pub source: SourceConfig,
    /// Calibration override (Kinect v1 defaults when absent)
    pub calibration: Option<Calibration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_mode: MappingMode::default(),
            smoothing: DEFAULT_SMOOTHING,
            world_scale: DEFAULT_WORLD_SCALE,
            source: SourceConfig::default(),
            calibration: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!("No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Calibration to build the coordinate mapper with
    pub fn calibration(&self) -> Calibration {
        self.calibration.unwrap_or_default()
    }

    /// Replace the source with a replay capture, keeping the configured rate
    pub fn with_replay(mut self, depth: PathBuf, color: PathBuf) -> Self {
        let fps = match self.source {
            SourceConfig::Synthetic { fps, .. } | SourceConfig::Replay { fps, .. } => fps,
        };
        self.source = SourceConfig::Replay { depth, color, fps };
        self
    }
}
