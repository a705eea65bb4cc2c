use crate::domain::errors::{ConfigurationError, ValidationError};
use thiserror::Error;

/// Pulse application error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {resource}")]
    NotFound { resource: String },
}

impl Error {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether the caller supplied bad input, as opposed to the system being
    /// misconfigured or failing
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
