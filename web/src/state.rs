//! Application state for Axum handlers.

use registrar_runtime::metrics::MetricsExporter;
use registrar_runtime::{Registrar, ScholarshipDesk};
use sqlx::PgPool;

/// State shared by every handler. Cloning is cheap; every member is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Registration, finalization and withdrawal
    pub registrar: Registrar,
    /// Scholarship intake
    pub scholarships: ScholarshipDesk,
    /// Database pool pinged by `/ready` (absent when running on in-memory doubles)
    pub pool: Option<PgPool>,
    /// Prometheus recorder rendered by `/metrics`
    pub metrics: Option<MetricsExporter>,
    /// Token that unlocks staff-only figures; staff views are disabled when unset
    pub staff_token: Option<String>,
}

impl AppState {
    /// State without a database pool or metrics recorder
    #[must_use]
    pub fn new(registrar: Registrar, scholarships: ScholarshipDesk) -> Self {
        Self { registrar, scholarships, pool: None, metrics: None, staff_token: None }
    }

    /// Attach the database pool
    #[must_use]
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Attach the metrics recorder
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsExporter) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Accept `token` in the staff token header
    #[must_use]
    pub fn with_staff_token(mut self, token: impl Into<String>) -> Self {
        self.staff_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registrar", &self.registrar)
            .field("pool", &self.pool.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("staff_token", &self.staff_token.is_some())
            .finish_non_exhaustive()
    }
}
