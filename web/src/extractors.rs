//! Path extractors.

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use registrar_core::PaymentProvider;

/// `/:provider/:intent_id` segments of a payment route.
///
/// An unknown provider tag is rejected with 400 before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPath {
    /// Gateway owning the intent
    pub provider: PaymentProvider,
    /// Provider-native intent ID
    pub intent_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for PaymentPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((provider, intent_id)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        let provider = provider
            .parse::<PaymentProvider>()
            .map_err(|e| AppError::bad_request(e.to_string()))?;

        if intent_id.trim().is_empty() {
            return Err(AppError::bad_request("Missing payment intent"));
        }

        Ok(Self { provider, intent_id })
    }
}
