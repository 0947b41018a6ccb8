//! Error types for gitpuller

use thiserror::Error;

/// Result type alias for gitpuller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitpuller operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote catalog rejected our credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote catalog could not be reached or answered with an error
    #[error("Transport error: {0}")]
    Transport(String),

    /// A child process could not be started at all
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was being started
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error came from the remote catalog.
    ///
    /// Catalog errors are fatal to a whole sync run; everything else is
    /// scoped to a single unit.
    pub fn is_catalog(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::Transport(_))
    }
}
