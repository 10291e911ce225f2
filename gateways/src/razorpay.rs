//! Regional gateway adapter (Razorpay orders).

use crate::error::ClientError;
use crate::http::{self, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use registrar_core::PaymentProvider;
use registrar_core::gateway::{GatewayError, IntentRequest, PaymentGateway, PaymentIntent};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API base
pub const RAZORPAY_API_URL: &str = "https://api.razorpay.com";

/// Order status once captured
const PAID: &str = "paid";

/// Razorpay connection settings.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Key ID (basic-auth user)
    pub key_id: String,
    /// Key secret (basic-auth password)
    pub key_secret: String,
    /// API base URL
    pub api_url: String,
    /// Client timeout
    pub timeout: Duration,
}

impl RazorpayConfig {
    /// Settings for the production API
    #[must_use]
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_url: RAZORPAY_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct OrderNotes<'a> {
    #[serde(rename = "eventId")]
    event_id: String,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateOrder<'a> {
    amount: u64,
    currency: String,
    notes: OrderNotes<'a>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

/// Regional gateway: the client reference is the order ID itself.
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    client: Client,
    config: RazorpayConfig,
}

impl RazorpayGateway {
    /// Create a gateway.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingCredential`] if the key ID or secret is blank
    /// - [`ClientError::Build`] if the HTTP client cannot be built
    pub fn new(config: RazorpayConfig) -> Result<Self, ClientError> {
        if config.key_id.trim().is_empty() {
            return Err(ClientError::MissingCredential("RAZORPAY_KEY_ID"));
        }
        if config.key_secret.trim().is_empty() {
            return Err(ClientError::MissingCredential("RAZORPAY_SECRET"));
        }
        Ok(Self { client: http::build_client(config.timeout)?, config })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Razorpay
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let body = CreateOrder {
            amount: request.total()?.cents(),
            currency: request.currency.to_uppercase(),
            notes: OrderNotes {
                event_id: request.event_id.to_string(),
                region: &request.region_webname,
            },
        };

        let order: OrderResponse = http::send_json(
            self.client
                .post(http::join(&self.config.api_url, "/v1/orders"))
                .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
                .json(&body),
        )
        .await?;

        tracing::debug!(order_id = %order.id, amount = body.amount, "Razorpay order created");
        Ok(PaymentIntent { client_reference: order.id.clone(), id: order.id })
    }

    async fn is_paid(&self, intent_id: &str) -> Result<bool, GatewayError> {
        let order: OrderResponse = http::send_json(
            self.client
                .get(http::resource(&self.config.api_url, &["v1", "orders", intent_id])?)
                .basic_auth(&self.config.key_id, Some(&self.config.key_secret)),
        )
        .await?;

        Ok(order.status.as_deref() == Some(PAID))
    }
}
