//! Card gateway adapter (Stripe payment intents).

use crate::error::ClientError;
use crate::http::{self, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use registrar_core::PaymentProvider;
use registrar_core::gateway::{GatewayError, IntentRequest, PaymentGateway, PaymentIntent};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Production API base
pub const STRIPE_API_URL: &str = "https://api.stripe.com";

/// Intent status meaning the charge went through
const SUCCEEDED: &str = "succeeded";

/// Stripe connection settings.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key
    pub secret_key: String,
    /// API base URL
    pub api_url: String,
    /// Descriptor printed on card statements
    pub statement_descriptor: String,
    /// Client timeout
    pub timeout: Duration,
}

impl StripeConfig {
    /// Settings for the production API
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_url: STRIPE_API_URL.to_string(),
            statement_descriptor: "Registration".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_url", &self.api_url)
            .field("statement_descriptor", &self.statement_descriptor)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Card gateway: the client reference is the intent's client secret.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    /// Create a gateway.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingCredential`] if the secret key is blank
    /// - [`ClientError::Build`] if the HTTP client cannot be built
    pub fn new(config: StripeConfig) -> Result<Self, ClientError> {
        if config.secret_key.trim().is_empty() {
            return Err(ClientError::MissingCredential("STRIPE_SECRET_KEY"));
        }
        Ok(Self { client: http::build_client(config.timeout)?, config })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let amount = request.total()?.cents().to_string();
        let event_id = request.event_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("statement_descriptor", self.config.statement_descriptor.as_str()),
            ("metadata[eventId]", event_id.as_str()),
            ("metadata[region]", request.region_webname.as_str()),
        ];

        let intent: IntentResponse = http::send_json(
            self.client
                .post(http::join(&self.config.api_url, "/v1/payment_intents"))
                .bearer_auth(&self.config.secret_key)
                .form(&form),
        )
        .await?;

        let client_secret = intent
            .client_secret
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("Error retrieving stripe client secret".to_string()))?;

        tracing::debug!(intent_id = %intent.id, amount = %amount, "Stripe payment intent created");
        Ok(PaymentIntent { id: intent.id, client_reference: client_secret })
    }

    async fn is_paid(&self, intent_id: &str) -> Result<bool, GatewayError> {
        let intent: IntentResponse = http::send_json(
            self.client
                .get(http::resource(&self.config.api_url, &["v1", "payment_intents", intent_id])?)
                .bearer_auth(&self.config.secret_key),
        )
        .await?;

        Ok(intent.status.as_deref() == Some(SUCCEEDED))
    }
}
