//! `PostgreSQL` persistence for the registrar.
//!
//! - [`PostgresRegistrationStore`]: events, promo codes, payments, people and tickets,
//!   with a locking issuance transaction
//! - [`PostgresTaskQueue`]: durable deferred tasks claimed with `FOR UPDATE SKIP LOCKED`
//! - [`migrate`]: embedded schema migrations
//!
//! # Example
//!
//! ```ignore
//! use registrar_postgres::{PostgresRegistrationStore, PostgresTaskQueue, migrate};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresRegistrationStore::connect("postgres://localhost/registrar").await?;
//!     migrate(store.pool()).await?;
//!     let queue = PostgresTaskQueue::new(store.pool().clone());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod queue;
mod rows;
pub mod store;

pub use queue::PostgresTaskQueue;
pub use store::PostgresRegistrationStore;

use registrar_core::store::StoreError;
use sqlx::PgPool;

/// Applies the embedded migrations.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
