//! Scriptable payment gateway.

use async_trait::async_trait;
use registrar_core::PaymentProvider;
use registrar_core::gateway::{GatewayError, IntentRequest, PaymentGateway, PaymentIntent};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    created: Vec<IntentRequest>,
    paid: HashSet<String>,
    failure: Option<GatewayError>,
    status_checks: usize,
}

/// Mock payment gateway
///
/// Intents are numbered `pi_mock_1`, `pi_mock_2`, ... (`order_mock_N` for the
/// regional provider). Nothing is paid until [`MockGateway::mark_paid`] is called.
#[derive(Debug)]
pub struct MockGateway {
    provider: PaymentProvider,
    state: Mutex<State>,
}

impl MockGateway {
    /// Creates a mock serving `provider`
    #[must_use]
    pub fn new(provider: PaymentProvider) -> Self {
        Self { provider, state: Mutex::new(State::default()) }
    }

    /// Creates an Arc-wrapped mock serving `provider`
    #[must_use]
    pub fn shared(provider: PaymentProvider) -> Arc<Self> {
        Arc::new(Self::new(provider))
    }

    /// Report an intent as paid from now on
    pub async fn mark_paid(&self, intent_id: &str) {
        self.state.lock().await.paid.insert(intent_id.to_string());
    }

    /// Fail every subsequent call with `error` (`None` to recover)
    pub async fn fail_with(&self, error: Option<GatewayError>) {
        self.state.lock().await.failure = error;
    }

    /// Requests received by `create_intent`
    pub async fn created(&self) -> Vec<IntentRequest> {
        self.state.lock().await.created.clone()
    }

    /// Number of `is_paid` calls
    pub async fn status_checks(&self) -> usize {
        self.state.lock().await.status_checks
    }

    const fn prefix(&self) -> &'static str {
        match self.provider {
            PaymentProvider::Stripe => "pi_mock",
            PaymentProvider::Razorpay => "order_mock",
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        request.total()?;

        state.created.push(request.clone());
        let id = format!("{}_{}", self.prefix(), state.created.len());
        let client_reference = match self.provider {
            PaymentProvider::Stripe => format!("{id}_secret"),
            PaymentProvider::Razorpay => id.clone(),
        };
        Ok(PaymentIntent { id, client_reference })
    }

    async fn is_paid(&self, intent_id: &str) -> Result<bool, GatewayError> {
        let mut state = self.state.lock().await;
        state.status_checks += 1;
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        Ok(state.paid.contains(intent_id))
    }
}
