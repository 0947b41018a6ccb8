//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// No token in the environment or the secrets file
    #[error(
        "GitHub token not found. Set GITHUB_TOKEN or run `gitpuller token set <TOKEN>`"
    )]
    MissingToken,

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify an octocrab failure as an auth problem or a plain API error
    pub(crate) fn from_octocrab(err: octocrab::Error) -> Self {
        let auth_message = match &err {
            octocrab::Error::GitHub { source, .. }
                if is_auth_failure(source.status_code.as_u16(), &source.message) =>
            {
                Some(source.message.clone())
            }
            _ => None,
        };

        match auth_message {
            Some(message) => Error::Auth(message),
            None => Error::Api(err),
        }
    }
}

/// Whether a GitHub error response means the credentials were rejected
pub(crate) fn is_auth_failure(status: u16, message: &str) -> bool {
    status == 401
        || message.contains("Bad credentials")
        || message.contains("Requires authentication")
}

impl From<Error> for gitpuller_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(_) | Error::MissingToken => gitpuller_core::Error::Auth(err.to_string()),
            Error::Api(_) | Error::Other(_) => gitpuller_core::Error::Transport(err.to_string()),
            Error::Parse(message) => gitpuller_core::Error::Config(message),
        }
    }
}
