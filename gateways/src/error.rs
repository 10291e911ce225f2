//! Error types for the HTTP adapters

use registrar_core::gateway::GatewayError;
use registrar_core::notify::NotifyError;
use registrar_core::region::RegionError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while building an adapter
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// A required credential is missing
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Outcome of one HTTP exchange, before it is mapped to a collaborator error.
#[derive(Debug)]
pub(crate) enum HttpFailure {
    /// The request exceeded the client timeout
    Timeout,
    /// Connection or transport failure
    Transport(String),
    /// Non-success status with the response body
    Status(StatusCode, String),
    /// Body could not be decoded
    Decode(String),
    /// Request URL could not be built
    Url(String),
}

impl HttpFailure {
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<HttpFailure> for GatewayError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Timeout => Self::Timeout,
            HttpFailure::Transport(message) | HttpFailure::Url(message) => Self::Http(message),
            HttpFailure::Status(status, message) => Self::Api { status: status.as_u16(), message },
            HttpFailure::Decode(message) => Self::InvalidResponse(message),
        }
    }
}

impl From<HttpFailure> for RegionError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Timeout => Self::Unavailable("timeout".to_string()),
            HttpFailure::Transport(message) | HttpFailure::Url(message) => Self::Unavailable(message),
            HttpFailure::Status(status, message) => Self::Unavailable(format!("{status}: {message}")),
            HttpFailure::Decode(message) => Self::InvalidResponse(message),
        }
    }
}

impl From<HttpFailure> for NotifyError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Timeout => Self::Delivery("timeout".to_string()),
            HttpFailure::Transport(message) | HttpFailure::Decode(message) | HttpFailure::Url(message) => {
                Self::Delivery(message)
            }
            HttpFailure::Status(status, message) => Self::Delivery(format!("{status}: {message}")),
        }
    }
}
