//! Error types for KhojNav

use thiserror::Error;

/// KhojNav error type
#[derive(Error, Debug)]
pub enum KhojError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pose estimator not initialized")]
    NotInitialized,

    #[error("Pose estimator already initialized")]
    AlreadyInitialized,

    #[error("{operation} did not complete within {iterations} iterations")]
    Liveness {
        operation: &'static str,
        iterations: usize,
    },

    #[error("Relocalization failed: {0}")]
    Localization(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<toml::de::Error> for KhojError {
    fn from(e: toml::de::Error) -> Self {
        KhojError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for KhojError {
    fn from(e: toml::ser::Error) -> Self {
        KhojError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KhojError>;
