//! # Registrar Web
//!
//! Axum HTTP surface over the registration engine.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /api/events/:id/registrations` | register participants |
//! | `GET /api/events/:id/promo-codes/:code` | preview a promo code |
//! | `GET /api/events/:id/remaining-tickets` | remaining seats (exact with `X-Staff-Token`) |
//! | `POST /api/events/:id/scholarships` | request a fee waiver |
//! | `POST /api/payments/:provider/:intent_id/finalize` | confirm a paid intent |
//! | `POST /api/payments/:provider/:intent_id/withdraw` | release an unpaid intent |
//! | `GET /health`, `GET /ready`, `GET /metrics` | operations |
//!
//! Errors are returned as `{"code": ..., "message": ...}`; see [`AppError`].
//!
//! # Example
//!
//! ```ignore
//! use registrar_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(registrar, desk));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use bootstrap::{Application, BootstrapError};
pub use config::Config;
pub use error::AppError;
pub use handlers::registrations::STAFF_TOKEN_HEADER;
pub use middleware::{REQUEST_ID_HEADER, RequestId, request_id_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
