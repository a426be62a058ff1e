//! Error types for pageloader
//!
//! The loading sequence itself never fails from the page's point of view:
//! failed resources count as settled and the safety timer always forces the
//! hand-off. What remains are configuration problems and internal misuse of
//! the state machines.

use thiserror::Error;

/// Main error type for the pageloader crate
#[derive(Error, Debug)]
pub enum LoaderError {
    /// State machine transition errors
    #[error("Invalid state transition from {from} via {event}: {reason}")]
    InvalidTransition {
        from: String,
        event: String,
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A simulated form was submitted while a submission was in flight
    #[error("Form is busy: submission already {state}")]
    FormBusy { state: String },

    /// A driver task or event channel went away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<toml::de::Error> for LoaderError {
    fn from(err: toml::de::Error) -> Self {
        LoaderError::ConfigError(format!("Failed to parse config: {}", err))
    }
}

impl From<toml::ser::Error> for LoaderError {
    fn from(err: toml::ser::Error) -> Self {
        LoaderError::ConfigError(format!("Failed to serialize config: {}", err))
    }
}
