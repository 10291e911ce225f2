//! # Registrar Testing
//!
//! Test doubles and fixtures for the registrar workspace.
//!
//! This crate provides:
//! - A pinned, manually advanced [`FixedClock`]
//! - [`InMemoryStore`]: a serialized in-memory `RegistrationStore`
//! - [`MockGateway`], [`StaticRegionDirectory`]
//! - [`RecordingNotifier`], [`RecordingMessenger`] that capture deliveries
//! - [`InMemoryTaskQueue`] for deferred scholarship tasks
//! - Fixture builders in [`fixtures`]
//!
//! ## Example
//!
//! ```
//! use registrar_core::store::RegistrationStore;
//! use registrar_testing::{fixtures, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! let event = fixtures::EventBuilder::new().capacity(10).build();
//! let event_id = event.id;
//!
//! tokio_test::block_on(async {
//!     store.insert_event(event).await;
//!     assert_eq!(store.count_tickets(event_id).await.ok(), Some(0));
//! });
//! ```

pub mod fixtures;
pub mod gateway;
pub mod mocks;
pub mod notify;
pub mod queue;
pub mod region;
pub mod store;

// Re-export commonly used items
pub use gateway::MockGateway;
pub use mocks::{FixedClock, test_clock};
pub use notify::{RecordingMessenger, RecordingNotifier};
pub use queue::InMemoryTaskQueue;
pub use region::StaticRegionDirectory;
pub use store::InMemoryStore;
