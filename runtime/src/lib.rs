//! # Registrar Runtime
//!
//! Use cases of the registration engine, built over the traits in `registrar-core`:
//!
//! - [`Registrar`]: registration, promo preview, remaining tickets, payment
//!   finalization and withdrawal
//! - [`ScholarshipDesk`] and [`DispositionWorker`]: scholarship dispositions through a
//!   durable task queue
//! - [`metrics`]: Prometheus recorder and business counters
//!
//! ## Example
//!
//! ```ignore
//! let registrar = Registrar::new(RegistrarEnvironment {
//!     store,
//!     gateways: GatewayRegistry::new().with(stripe),
//!     regions,
//!     notifier,
//!     clock: Arc::new(SystemClock),
//! });
//!
//! let reference = registrar.register_for_event(request).await?;
//! ```

pub mod dispatch;
pub mod finalization;
pub mod metrics;
pub mod registrar;
pub mod scholarship;

pub use dispatch::{DispatchReport, dispatch_ticket_notices};
pub use registrar::{Registrar, RegistrarEnvironment, Registration};
pub use scholarship::{DispositionWorker, ScholarshipDesk, ScholarshipSettings, WorkerSettings};
