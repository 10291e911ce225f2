//! Router.

use crate::handlers::{self, payments, registrations, scholarships};
use crate::middleware::request_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/events/:id/registrations", post(registrations::register))
        .route("/events/:id/promo-codes/:code", get(registrations::check_promo_code))
        .route("/events/:id/remaining-tickets", get(registrations::remaining_tickets))
        .route("/events/:id/scholarships", post(scholarships::request_scholarship))
        .route("/payments/:provider/:intent_id/finalize", post(payments::finalize))
        .route("/payments/:provider/:intent_id/withdraw", post(payments::withdraw));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
