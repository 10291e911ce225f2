//! Regional payment configuration.

use crate::error::RegistrationError;
use crate::types::{Currency, PaymentProvider};
use async_trait::async_trait;
use thiserror::Error;

/// Region lookup error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// No region with this webname
    #[error("Region not found: {0}")]
    NotFound(String),

    /// The content service could not be reached
    #[error("Region service unavailable: {0}")]
    Unavailable(String),

    /// The content service returned an unexpected payload
    #[error("Invalid region payload: {0}")]
    InvalidResponse(String),
}

/// Payment settings configured for a region. Both fields are optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionPaymentInfo {
    /// Expected provider (`None` = card gateway)
    pub payment_provider: Option<PaymentProvider>,
    /// Charge currency (`None` = provider default)
    pub currency: Option<Currency>,
}

/// Region/currency lookup collaborator.
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    /// Payment settings for the region with this webname.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the lookup fails.
    async fn payment_info(&self, webname: &str) -> Result<RegionPaymentInfo, RegionError>;
}

/// Cross-checks the requested provider against the region and picks the currency.
///
/// # Errors
///
/// Returns [`RegistrationError::WrongProvider`] if the region expects another provider.
pub fn resolve_payment_terms(
    info: &RegionPaymentInfo,
    requested: PaymentProvider,
) -> Result<Currency, RegistrationError> {
    let expected = info.payment_provider.unwrap_or_default();
    if expected != requested {
        return Err(RegistrationError::WrongProvider { expected, requested });
    }

    Ok(info
        .currency
        .clone()
        .unwrap_or_else(|| requested.default_currency()))
}
