// SPDX-License-Identifier: MPL-2.0

//! Depth Mapping - depth/color coordinate mapping viewer
//!
//! This library maps between the depth camera, the color camera and 3D
//! camera space of a depth sensor, and presents the result as a point cloud
//! or a registered image.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`sensor`]: Sensor device and coordinate mapper abstraction, with a
//!   synthetic scene and a still-capture replay device
//! - [`mapping`]: The per-frame mapper and its five visualization modes
//! - [`render`]: Orbit camera and software point rasterizer
//! - [`app`]: Viewer state tying sensor, mapper and view together
//! - [`terminal`]: Terminal shell (input and half-block output)
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let mut app = App::new(create_device(&config)?, &config);
//! app.handle_key('3');
//! app.update()?;
//! ```

pub mod app;
pub mod config;
pub mod constants;
pub mod errors;
pub mod mapping;
pub mod render;
pub mod sensor;
pub mod terminal;

// Re-export commonly used types
pub use app::App;
pub use config::{Config, SourceConfig};
pub use errors::{AppError, AppResult};
pub use mapping::{FrameMapper, MapOutcome, MappingMode, PointCloudMesh};
pub use sensor::{CoordinateMapper, SensorDevice};
