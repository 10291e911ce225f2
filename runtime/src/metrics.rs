//! Prometheus metrics for registrations, payments and scholarships.
//!
//! # Example
//!
//! ```rust,no_run
//! use registrar_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//!
//! // Serve `exporter.render()` from an HTTP handler
//! println!("{}", exporter.render());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use registrar_core::PaymentProvider;
use registrar_core::scholarship::Disposition;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Describe all metrics and install the global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or a recorder is already
    /// installed. Call this once per process.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!("Prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "registrar_registrations_total",
        "Registration attempts by outcome"
    );
    describe_counter!(
        "registrar_tickets_issued_total",
        "Tickets created by issuance"
    );
    describe_counter!(
        "registrar_payments_finalized_total",
        "Payments confirmed and finalized"
    );
    describe_counter!(
        "registrar_payments_withdrawn_total",
        "Unpaid payments withdrawn"
    );
    describe_counter!(
        "registrar_tickets_withdrawn_total",
        "Tickets deleted by withdrawals"
    );
    describe_counter!(
        "registrar_notifications_failed_total",
        "Post-commit notifications that failed, by kind"
    );
    describe_counter!(
        "registrar_scholarships_total",
        "Scholarship requests by disposition"
    );
    describe_counter!(
        "registrar_deferred_tasks_total",
        "Deferred tasks executed, by kind and result"
    );
    describe_histogram!(
        "registrar_gateway_duration_seconds",
        "Payment gateway call latency"
    );
}

/// Registration metrics recorder.
pub struct RegistrationMetrics;

impl RegistrationMetrics {
    /// Record a successful registration.
    pub fn record_success(tickets: usize, paid: bool) {
        let outcome = if paid { "awaiting_payment" } else { "issued" };
        counter!("registrar_registrations_total", "outcome" => outcome).increment(1);
        counter!("registrar_tickets_issued_total").increment(tickets as u64);
    }

    /// Record a rejected or failed registration.
    pub fn record_failure(outcome: &'static str) {
        counter!("registrar_registrations_total", "outcome" => outcome).increment(1);
    }
}

/// Payment metrics recorder.
pub struct PaymentMetrics;

impl PaymentMetrics {
    /// Record a gateway call.
    pub fn record_gateway_call(provider: PaymentProvider, operation: &'static str, duration: Duration) {
        histogram!(
            "registrar_gateway_duration_seconds",
            "provider" => provider.as_str(),
            "operation" => operation
        )
        .record(duration.as_secs_f64());
    }

    /// Record a finalized payment.
    pub fn record_finalized(provider: PaymentProvider) {
        counter!("registrar_payments_finalized_total", "provider" => provider.as_str()).increment(1);
    }

    /// Record a withdrawn payment.
    pub fn record_withdrawn(provider: PaymentProvider, tickets: usize) {
        counter!("registrar_payments_withdrawn_total", "provider" => provider.as_str()).increment(1);
        counter!("registrar_tickets_withdrawn_total").increment(tickets as u64);
    }
}

/// Notification metrics recorder.
pub struct NotificationMetrics;

impl NotificationMetrics {
    /// Record a failed delivery.
    pub fn record_failure(kind: &'static str) {
        counter!("registrar_notifications_failed_total", "kind" => kind).increment(1);
    }
}

/// Scholarship metrics recorder.
pub struct ScholarshipMetrics;

impl ScholarshipMetrics {
    /// Record a disposition decision.
    pub fn record_disposition(disposition: Disposition) {
        counter!("registrar_scholarships_total", "disposition" => disposition.label()).increment(1);
    }

    /// Record an executed deferred task.
    pub fn record_task(kind: &'static str, succeeded: bool) {
        let result = if succeeded { "ok" } else { "failed" };
        counter!("registrar_deferred_tasks_total", "kind" => kind, "result" => result).increment(1);
    }
}
