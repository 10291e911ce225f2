//! Error types for web handlers.
//!
//! [`AppError`] bridges [`RegistrationError`] and HTTP responses. The body is always
//! `{"code": ..., "message": ...}`; the message is the registrant-facing text for
//! business-rule failures and a generic line for internal ones.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use registrar_core::{ErrorKind, RegistrationError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self { status, message, code, source: None }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST".to_string())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse { code: self.code, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for AppError {
    fn from(error: RegistrationError) -> Self {
        let code = error.code().to_string();
        match error.kind() {
            ErrorKind::UserInput => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, error.to_string(), code)
            }
            ErrorKind::BusinessRule | ErrorKind::Transient | ErrorKind::Operator => {
                Self::new(StatusCode::CONFLICT, error.to_string(), code)
            }
            ErrorKind::NotFound => Self::new(StatusCode::NOT_FOUND, error.to_string(), code),
            ErrorKind::Infrastructure => {
                let status = match error {
                    RegistrationError::Gateway(_) | RegistrationError::Region(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                Self::new(status, "An internal error occurred".to_string(), code)
                    .with_source(anyhow::Error::new(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::gateway::GatewayError;
    use registrar_core::store::StoreError;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_validation_is_unprocessable() {
        let err = AppError::from(RegistrationError::GuardianRequired);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "GUARDIAN_REQUIRED");
    }

    #[test]
    fn test_business_rules_conflict() {
        let capacity = AppError::from(RegistrationError::CapacityExceeded { remaining: 1, requested: 2 });
        assert_eq!(capacity.status(), StatusCode::CONFLICT);
        assert_eq!(
            capacity.to_string(),
            "[CAPACITY_EXCEEDED] Sorry, only 1 tickets are still available for this event."
        );

        let incomplete = AppError::from(RegistrationError::PaymentIncomplete);
        assert_eq!(incomplete.status(), StatusCode::CONFLICT);
        assert_eq!(incomplete.code(), "PAYMENT_INCOMPLETE");
    }

    #[test]
    fn test_infrastructure_hides_detail() {
        let gateway = AppError::from(RegistrationError::Gateway(GatewayError::Timeout));
        assert_eq!(gateway.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(gateway.to_string(), "[GATEWAY_ERROR] An internal error occurred");
        assert!(std::error::Error::source(&gateway).is_some());

        let store = AppError::from(RegistrationError::Store(StoreError::Database("down".to_string())));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
