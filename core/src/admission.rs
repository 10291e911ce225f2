//! Admission control: the registration-window and capacity gate.

use crate::error::RegistrationError;
use crate::types::Event;

/// Public counts above this are reported in steps of [`PUBLIC_ROUNDING`].
pub const PUBLIC_EXACT_THRESHOLD: u32 = 10;
/// Step used to blur public remaining-ticket counts
pub const PUBLIC_ROUNDING: u32 = 5;

/// Who is asking for the remaining-ticket figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Audience {
    /// Anonymous registrants
    #[default]
    Public,
    /// Organizers and volunteers
    Staff,
}

/// Checks that `requested` tickets may be issued when `sold` already exist.
///
/// An event without a venue, or whose venue has no (or zero) capacity, does not accept
/// registrations.
///
/// # Errors
///
/// - [`RegistrationError::RegistrationClosed`] if registrations are off or capacity is unknown
/// - [`RegistrationError::CapacityExceeded`] if fewer than `requested` seats remain
pub fn admit(event: &Event, sold: u32, requested: u32) -> Result<(), RegistrationError> {
    let capacity = match event.capacity() {
        Some(capacity) if capacity > 0 && event.registrations_open => capacity,
        _ => return Err(RegistrationError::RegistrationClosed),
    };

    let remaining = capacity.saturating_sub(sold);
    if remaining < requested {
        return Err(RegistrationError::CapacityExceeded { remaining, requested });
    }

    Ok(())
}

/// Remaining seats, or `None` when capacity is unknown.
///
/// The public figure is floored to a multiple of five once more than ten seats remain.
#[must_use]
pub fn remaining_tickets(event: &Event, sold: u32, audience: Audience) -> Option<u32> {
    let capacity = event.capacity().filter(|capacity| *capacity > 0)?;
    let remaining = capacity.saturating_sub(sold);

    if remaining <= PUBLIC_EXACT_THRESHOLD || audience == Audience::Staff {
        Some(remaining)
    } else {
        Some(remaining / PUBLIC_ROUNDING * PUBLIC_ROUNDING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventId, Money, Venue, VenueId};
    use chrono::Utc;
    use proptest::prelude::*;

    fn event_with_capacity(capacity: Option<u32>) -> Event {
        Event {
            id: EventId::new(),
            name: "Spring Hack".to_string(),
            region_webname: "seattle".to_string(),
            venue: Some(Venue { id: VenueId::new(), name: "Hall".to_string(), capacity }),
            ticket_price: Money::from_cents(2000),
            early_bird_price: None,
            early_bird_cutoff: None,
            registrations_open: true,
            registration_cutoff: Utc::now(),
            min_age: None,
            max_age: None,
            majority_age: None,
            requires_promo_code: false,
        }
    }

    #[test]
    fn test_capacity_ten_sold_nine() {
        let event = event_with_capacity(Some(10));
        assert!(matches!(
            admit(&event, 9, 2),
            Err(RegistrationError::CapacityExceeded { remaining: 1, requested: 2 })
        ));
        assert!(admit(&event, 9, 1).is_ok());
    }

    #[test]
    fn test_unknown_capacity_is_closed() {
        assert!(matches!(
            admit(&event_with_capacity(None), 0, 1),
            Err(RegistrationError::RegistrationClosed)
        ));
        assert!(matches!(
            admit(&event_with_capacity(Some(0)), 0, 1),
            Err(RegistrationError::RegistrationClosed)
        ));

        let mut no_venue = event_with_capacity(Some(10));
        no_venue.venue = None;
        assert!(matches!(admit(&no_venue, 0, 1), Err(RegistrationError::RegistrationClosed)));
    }

    #[test]
    fn test_closed_flag() {
        let mut event = event_with_capacity(Some(100));
        event.registrations_open = false;
        assert!(matches!(admit(&event, 0, 1), Err(RegistrationError::RegistrationClosed)));
    }

    #[test]
    fn test_remaining_tickets_rounding() {
        let event = event_with_capacity(Some(100));
        assert_eq!(remaining_tickets(&event, 63, Audience::Public), Some(35));
        assert_eq!(remaining_tickets(&event, 63, Audience::Staff), Some(37));
        assert_eq!(remaining_tickets(&event, 92, Audience::Public), Some(8));
        assert_eq!(remaining_tickets(&event, 120, Audience::Public), Some(0));
        assert_eq!(remaining_tickets(&event_with_capacity(None), 0, Audience::Public), None);
    }

    proptest! {
        #[test]
        fn prop_admit_iff_request_fits(capacity in 1u32..500, sold in 0u32..500, requested in 1u32..50) {
            let event = event_with_capacity(Some(capacity));
            let fits = requested <= capacity.saturating_sub(sold);
            match admit(&event, sold, requested) {
                Ok(()) => prop_assert!(fits),
                Err(RegistrationError::CapacityExceeded { .. }) => prop_assert!(!fits),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }
}
