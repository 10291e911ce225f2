//! # Registrar Core
//!
//! Domain types, business rules and dependency traits for the event registration &
//! payment orchestration engine.
//!
//! This crate contains no I/O. Everything that talks to the outside world (databases,
//! payment gateways, the regional content service, notification collaborators, timers)
//! is expressed as a trait and injected by the runtime.
//!
//! ## Core Concepts
//!
//! - **Admission**: the capacity / registration-window gate ([`admission`])
//! - **Pricing**: the active ticket price and promo discounts ([`pricing`], [`promo`])
//! - **Validation**: ticket and guardian payload checks ([`validation`])
//! - **Gateways**: capability interface over payment back-ends ([`gateway`])
//! - **Store**: persistence with an atomic, capacity-checked issuance ([`store`])
//! - **Scholarships**: reason → disposition rules and deferred tasks
//!   ([`scholarship`], [`scheduler`])
//!
//! ## Flow
//!
//! ```text
//! request → validate → admit → guardian check → promo + price
//!         → (price > 0) region check + gateway intent
//!         → atomic issuance (payment, guardian, tickets)
//!         → (price == 0) best-effort notifications
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod pricing;
pub mod promo;
pub mod region;
pub mod scheduler;
pub mod scholarship;
pub mod store;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{ErrorKind, RegistrationError};
pub use types::*;
