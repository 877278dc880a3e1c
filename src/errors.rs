// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the depth mapping application

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for sensor device operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type for coordinate mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Sensor device errors
    Sensor(SensorError),
    /// Coordinate mapping errors
    Mapping(MappingError),
    /// Configuration errors
    Config(String),
    /// Filesystem I/O errors
    Io(String),
}

/// Sensor device errors
#[derive(Debug, Clone)]
pub enum SensorError {
    /// A source was initialized before the device was opened
    NotOpen,
    /// Loading frame data from disk failed
    Load(String),
    /// The device's coordinate mapper rejected a request
    Mapping(MappingError),
}

/// Coordinate mapping errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A buffer handed to the mapper does not match the calibrated frame size
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Sensor(e) => write!(f, "Sensor error: {}", e),
            AppError::Mapping(e) => write!(f, "Mapping error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::NotOpen => write!(f, "Sensor is not open"),
            SensorError::Load(msg) => write!(f, "Failed to load frame: {}", msg),
            SensorError::Mapping(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::SizeMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "{} has {} elements, expected {}",
                what, actual, expected
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SensorError {}
impl std::error::Error for MappingError {}

impl MappingError {
    /// Check a buffer length against the length the mapper was calibrated for
    pub fn check(what: &'static str, expected: usize, actual: usize) -> MappingResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(MappingError::SizeMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}

// Conversions from sub-errors to AppError
impl From<SensorError> for AppError {
    fn from(err: SensorError) -> Self {
        AppError::Sensor(err)
    }
}

impl From<MappingError> for AppError {
    fn from(err: MappingError) -> Self {
        AppError::Mapping(err)
    }
}

impl From<MappingError> for SensorError {
    fn from(err: MappingError) -> Self {
        SensorError::Mapping(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
