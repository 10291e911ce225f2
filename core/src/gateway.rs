//! Payment gateway capability interface.
//!
//! Each back-end (card gateway, regional gateway) implements [`PaymentGateway`]; the
//! orchestrator picks one through a [`GatewayRegistry`] keyed by [`PaymentProvider`].

use crate::types::{Currency, EventId, Money, PaymentProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Payment gateway error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway did not answer within the client timeout
    #[error("Gateway timeout")]
    Timeout,

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The gateway rejected the call
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Gateway message
        message: String,
    },

    /// The gateway answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No gateway is registered for this provider
    #[error("Payment provider not configured: {0}")]
    NotConfigured(PaymentProvider),

    /// Amount does not fit the gateway's integer range
    #[error("Amount overflow")]
    AmountOverflow,
}

/// Everything a gateway needs to open a charge for one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Unit ticket price after discounts
    pub unit_price: Money,
    /// Currency to charge in
    pub currency: Currency,
    /// Number of tickets
    pub quantity: u32,
    /// Event being paid for
    pub event_id: EventId,
    /// Event display name
    pub event_name: String,
    /// Region webname of the event
    pub region_webname: String,
}

impl IntentRequest {
    /// Total charge (`unit_price × quantity`)
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AmountOverflow`] if the product overflows.
    pub const fn total(&self) -> Result<Money, GatewayError> {
        match self.unit_price.checked_multiply(self.quantity) {
            Some(total) => Ok(total),
            None => Err(GatewayError::AmountOverflow),
        }
    }
}

/// A gateway-side handle for a pending charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Provider-native intent / order ID
    pub id: String,
    /// Value handed to the client to complete payment (client secret or order ID)
    pub client_reference: String,
}

/// Payment gateway trait
///
/// Calls are single attempts: implementations never retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider tag this gateway serves
    fn provider(&self) -> PaymentProvider;

    /// Opens a payment intent for the request total.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway call fails or times out.
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, GatewayError>;

    /// Whether the gateway reports the intent as paid.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway call fails or times out.
    async fn is_paid(&self, intent_id: &str) -> Result<bool, GatewayError>;
}

/// Provider tag → gateway lookup.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under its own provider tag, replacing any previous one.
    #[must_use]
    pub fn with(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.register(gateway);
        self
    }

    /// Registers a gateway under its own provider tag, replacing any previous one.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    /// Gateway for a provider.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConfigured`] if no gateway serves `provider`.
    pub fn get(&self, provider: PaymentProvider) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.gateways
            .get(&provider)
            .cloned()
            .ok_or(GatewayError::NotConfigured(provider))
    }

    /// Registered providers
    pub fn providers(&self) -> impl Iterator<Item = PaymentProvider> + '_ {
        self.gateways.keys().copied()
    }
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("providers", &self.gateways.keys().collect::<Vec<_>>())
            .finish()
    }
}
