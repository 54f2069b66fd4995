use std::io;
use thiserror::Error;

/// Custom error type for SDM
#[derive(Error, Debug)]
pub enum SdmError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("Startup failed: {0}")]
    StartupFatal(String),
}

/// Failure to read usage figures for a single volume.
///
/// Always local to one volume and one poll cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("volume {0} is not mounted")]
    NotMounted(String),

    #[error("volume {0} reports no capacity")]
    NoCapacity(String),

    #[error("volume {volume} is inaccessible: {reason}")]
    Inaccessible { volume: String, reason: String },
}

/// Result type alias for SDM
pub type Result<T> = std::result::Result<T, SdmError>;

impl SdmError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SdmError::Config(msg.into())
    }

    /// Create a validation error for a rejected config change
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        SdmError::ConfigValidation(msg.into())
    }

    pub fn startup_fatal<S: Into<String>>(msg: S) -> Self {
        SdmError::StartupFatal(msg.into())
    }
}
