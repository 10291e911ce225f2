//! HTTP request handlers.

pub mod health;
pub mod payments;
pub mod registrations;
pub mod scholarships;

pub use health::{health_check, metrics, readiness_check};
