//! Price resolution.
//!
//! Pure functions of an [`Event`], an optional [`PromoCode`] and the current time.

use crate::error::RegistrationError;
use crate::types::{Discount, Event, Money, PromoCode};
use chrono::{DateTime, Utc};

/// Whether the registration window is open at `now`.
///
/// The cutoff instant itself still accepts registrations.
#[must_use]
pub fn can_register(event: &Event, now: DateTime<Utc>) -> bool {
    event.registrations_open && now <= event.registration_cutoff
}

/// Unit ticket price active at `now`, or `None` when registration is closed.
///
/// The early-bird price applies strictly before its cutoff.
#[must_use]
pub fn active_price(event: &Event, now: DateTime<Utc>) -> Option<Money> {
    if !can_register(event, now) {
        return None;
    }

    match (event.early_bird_price, event.early_bird_cutoff) {
        (Some(early), Some(cutoff)) if now < cutoff => Some(early),
        _ => Some(event.ticket_price),
    }
}

/// Applies a discount to a unit price, flooring at zero.
#[must_use]
pub const fn apply_discount(price: Money, discount: Discount) -> Money {
    match discount {
        Discount::Subtract(amount) => price.saturating_sub(amount),
        Discount::Percent(basis_points) => price.apply_percent_discount(basis_points),
    }
}

/// Unit price a registrant owes at `now`, after the promo code (if any).
///
/// # Errors
///
/// - [`RegistrationError::RegistrationClosed`] when there is no active price
/// - [`RegistrationError::PromoMismatch`] when the promo belongs to another event
pub fn compute_price(
    event: &Event,
    promo: Option<&PromoCode>,
    now: DateTime<Utc>,
) -> Result<Money, RegistrationError> {
    let price = active_price(event, now).ok_or(RegistrationError::RegistrationClosed)?;

    let Some(promo) = promo else {
        return Ok(price);
    };

    if promo.event_id != event.id {
        return Err(RegistrationError::PromoMismatch);
    }

    Ok(apply_discount(price, promo.discount))
}
