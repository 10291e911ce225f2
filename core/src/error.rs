//! Registration error taxonomy.
//!
//! Every rejection the orchestrator can produce is a [`RegistrationError`] variant. The
//! `Display` text is the message shown to the registrant, so business-rule variants
//! carry human wording rather than internal detail.

use crate::gateway::GatewayError;
use crate::region::RegionError;
use crate::scheduler::SchedulingError;
use crate::store::StoreError;
use crate::types::{EventId, PaymentProvider};
use thiserror::Error;

/// Errors produced by registration, finalization and withdrawal.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The request payload is malformed or incomplete.
    ///
    /// Carries every problem found, in ticket order.
    #[error("{}", .0.join(" "))]
    ValidationFailed(Vec<String>),

    /// Registration is closed (flag off, past cutoff, or no venue capacity).
    #[error("Registrations for this event are not open.")]
    RegistrationClosed,

    /// Not enough seats remain for the requested number of tickets.
    #[error("Sorry, only {remaining} tickets are still available for this event.")]
    CapacityExceeded {
        /// Seats still available
        remaining: u32,
        /// Tickets requested
        requested: u32,
    },

    /// The event only admits registrants holding a promo code.
    #[error("A code is required to register for this event.")]
    PromoRequired,

    /// The resolved promo code belongs to a different event.
    #[error("Event does not contain this promo code!")]
    PromoMismatch,

    /// The promo code ran out of uses between resolution and issuance.
    #[error("The code {code} has no uses remaining for this many tickets.")]
    PromoExhausted {
        /// Code text
        code: String,
    },

    /// The provider chosen by the client is not the one configured for the region.
    #[error("Incorrect payment provider.")]
    WrongProvider {
        /// Provider configured for the region
        expected: PaymentProvider,
        /// Provider sent by the client
        requested: PaymentProvider,
    },

    /// A participant is a minor and no guardian data was supplied.
    #[error("Guardian data is required because a participant is a minor.")]
    GuardianRequired,

    /// The gateway has not confirmed the payment yet. Retry later.
    #[error("Payment has not yet completed. Please contact support.")]
    PaymentIncomplete,

    /// The gateway reports the payment as paid, so it cannot be withdrawn.
    #[error("Payment was partially processed. Please contact support to resolve issues.")]
    AlreadyPaid,

    /// No event with this ID.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// Payment gateway failure.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Region lookup failure.
    #[error("Region lookup error: {0}")]
    Region(#[from] RegionError),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Deferred task could not be scheduled.
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),
}

/// Coarse classification used for HTTP mapping and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something they can correct
    UserInput,
    /// A business rule rejected the request
    BusinessRule,
    /// Retry later
    Transient,
    /// Needs a human to resolve
    Operator,
    /// Lookup found nothing
    NotFound,
    /// Downstream dependency failed
    Infrastructure,
}

impl RegistrationError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed(_) | Self::GuardianRequired => ErrorKind::UserInput,
            Self::RegistrationClosed
            | Self::CapacityExceeded { .. }
            | Self::PromoRequired
            | Self::PromoMismatch
            | Self::PromoExhausted { .. }
            | Self::WrongProvider { .. } => ErrorKind::BusinessRule,
            Self::PaymentIncomplete => ErrorKind::Transient,
            Self::AlreadyPaid => ErrorKind::Operator,
            Self::EventNotFound(_) => ErrorKind::NotFound,
            Self::Gateway(_) | Self::Region(_) | Self::Store(_) | Self::Scheduling(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::PromoRequired => "PROMO_REQUIRED",
            Self::PromoMismatch => "PROMO_MISMATCH",
            Self::PromoExhausted { .. } => "PROMO_EXHAUSTED",
            Self::WrongProvider { .. } => "WRONG_PROVIDER",
            Self::GuardianRequired => "GUARDIAN_REQUIRED",
            Self::PaymentIncomplete => "PAYMENT_INCOMPLETE",
            Self::AlreadyPaid => "ALREADY_PAID",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Region(_) => "REGION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Scheduling(_) => "SCHEDULING_ERROR",
        }
    }

    /// Metrics label for a failed registration
    #[must_use]
    pub const fn outcome_label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::UserInput => "invalid",
            ErrorKind::BusinessRule => "rejected",
            ErrorKind::Transient => "pending",
            ErrorKind::Operator => "operator",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Infrastructure => "error",
        }
    }
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, RegistrationError>;
