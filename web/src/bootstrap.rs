//! Wiring from [`Config`] to a running [`AppState`] and disposition worker.

use crate::config::{Config, GatewayConfig, PostgresConfig};
use crate::state::AppState;
use registrar_core::environment::SystemClock;
use registrar_core::gateway::GatewayRegistry;
use registrar_core::store::StoreError;
use registrar_gateways::{
    ClientError, CmsRegionDirectory, HttpNotifier, NotifierEndpoints, RazorpayConfig,
    RazorpayGateway, StripeConfig, StripeGateway,
};
use registrar_postgres::{PostgresRegistrationStore, PostgresTaskQueue, migrate};
use registrar_runtime::{DispositionWorker, Registrar, RegistrarEnvironment, ScholarshipDesk};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Startup failures.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Database connection or migration failed
    #[error("Database setup failed: {0}")]
    Database(#[from] StoreError),

    /// An HTTP adapter could not be built
    #[error("Client setup failed: {0}")]
    Client(#[from] ClientError),
}

/// Gateways with credentials present. Missing credentials leave the provider
/// unregistered, so requests for it fail with `NotConfigured`.
///
/// # Errors
///
/// Returns [`ClientError`] if an HTTP client cannot be built.
pub fn gateway_registry(config: &GatewayConfig) -> Result<GatewayRegistry, ClientError> {
    let mut registry = GatewayRegistry::new();

    if let Some(secret_key) = &config.stripe_secret_key {
        let stripe = StripeGateway::new(StripeConfig {
            secret_key: secret_key.clone(),
            api_url: config.stripe_api_url.clone(),
            statement_descriptor: config.stripe_statement_descriptor.clone(),
            timeout: config.timeout(),
        })?;
        registry.register(Arc::new(stripe));
    } else {
        tracing::warn!("STRIPE_SECRET_KEY not set, card payments disabled");
    }

    if let Some((key_id, key_secret)) = config.razorpay_credentials() {
        let razorpay = RazorpayGateway::new(RazorpayConfig {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            api_url: config.razorpay_api_url.clone(),
            timeout: config.timeout(),
        })?;
        registry.register(Arc::new(razorpay));
    } else {
        tracing::warn!("Razorpay credentials not set, regional payments disabled");
    }

    Ok(registry)
}

/// Open the pool and apply migrations.
///
/// # Errors
///
/// Returns [`StoreError`] if the database is unreachable or a migration fails.
pub async fn connect_database(config: &PostgresConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Everything the server binary runs.
pub struct Application {
    /// Handler state
    pub state: AppState,
    /// Deferred-task worker, not yet spawned
    pub worker: DispositionWorker,
    /// Send `true` to stop the worker
    pub worker_shutdown: watch::Sender<bool>,
}

impl Application {
    /// Build the application over an open pool.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Client`] if an HTTP adapter cannot be built.
    pub fn build(config: &Config, pool: PgPool) -> Result<Self, BootstrapError> {
        let timeout = config.gateways.timeout();
        let notifications = &config.notifications;
        let notifier = Arc::new(HttpNotifier::with_timeout(
            NotifierEndpoints {
                waiver_url: notifications.waiver_url.clone(),
                webhook_url: notifications.webhook_url.clone(),
                message_url: notifications.message_url.clone(),
                staff_url: notifications.staff_url.clone(),
            },
            timeout,
        )?);

        let registrar = Registrar::new(RegistrarEnvironment {
            store: Arc::new(PostgresRegistrationStore::from_pool(pool.clone())),
            gateways: gateway_registry(&config.gateways)?,
            regions: Arc::new(CmsRegionDirectory::with_timeout(
                config.region.cms_endpoint.clone(),
                timeout,
            )?),
            notifier: notifier.clone(),
            clock: Arc::new(SystemClock),
        });

        let desk = ScholarshipDesk::new(
            registrar.clone(),
            Arc::new(PostgresTaskQueue::new(pool.clone())),
            notifier,
            config.scholarship.settings(),
        );
        let (worker, worker_shutdown) =
            DispositionWorker::new(desk.clone(), config.scholarship.worker());

        let mut state = AppState::new(registrar, desk).with_pool(pool);
        if let Some(token) = &config.server.staff_token {
            state = state.with_staff_token(token.clone());
        }

        Ok(Self {
            state,
            worker,
            worker_shutdown,
        })
    }
}
