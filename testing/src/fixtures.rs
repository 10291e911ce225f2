//! Fixture builders.
//!
//! Defaults are chosen relative to [`test_clock`](crate::test_clock): registration
//! is open for another 30 days and the venue seats 100.

use crate::mocks::test_clock;
use chrono::{DateTime, Duration, Utc};
use registrar_core::environment::Clock;
use registrar_core::{
    Contact, Discount, Event, EventId, GuardianInput, Money, PaymentProvider, PromoCode,
    PromoCodeId, RegistrationRequest, TicketInput, TicketType, Venue, VenueId,
};

/// Builder for [`Event`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Open, $20.00, 100 seats, region `seattle`
    #[must_use]
    pub fn new() -> Self {
        let now = test_clock().now();
        Self {
            event: Event {
                id: EventId::new(),
                name: "Spring Hack".to_string(),
                region_webname: "seattle".to_string(),
                venue: Some(Venue {
                    id: VenueId::new(),
                    name: "Main Hall".to_string(),
                    capacity: Some(100),
                }),
                ticket_price: Money::from_cents(2000),
                early_bird_price: None,
                early_bird_cutoff: None,
                registrations_open: true,
                registration_cutoff: now + Duration::days(30),
                min_age: None,
                max_age: None,
                majority_age: None,
                requires_promo_code: false,
            },
        }
    }

    /// Set the event ID
    #[must_use]
    pub const fn id(mut self, id: EventId) -> Self {
        self.event.id = id;
        self
    }

    /// Set the display name
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.event.name = name.to_string();
        self
    }

    /// Set the region webname
    #[must_use]
    pub fn region(mut self, webname: &str) -> Self {
        self.event.region_webname = webname.to_string();
        self
    }

    /// Set the venue capacity
    #[must_use]
    pub fn capacity(mut self, capacity: u32) -> Self {
        if let Some(venue) = self.event.venue.as_mut() {
            venue.capacity = Some(capacity);
        }
        self
    }

    /// Remove the venue
    #[must_use]
    pub fn without_venue(mut self) -> Self {
        self.event.venue = None;
        self
    }

    /// Set the standard price
    #[must_use]
    pub const fn price(mut self, price: Money) -> Self {
        self.event.ticket_price = price;
        self
    }

    /// Free event
    #[must_use]
    pub const fn free(self) -> Self {
        self.price(Money::ZERO)
    }

    /// Early-bird price active before `cutoff`
    #[must_use]
    pub const fn early_bird(mut self, price: Money, cutoff: DateTime<Utc>) -> Self {
        self.event.early_bird_price = Some(price);
        self.event.early_bird_cutoff = Some(cutoff);
        self
    }

    /// Close registrations
    #[must_use]
    pub const fn closed(mut self) -> Self {
        self.event.registrations_open = false;
        self
    }

    /// Set the registration cutoff
    #[must_use]
    pub const fn registration_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.event.registration_cutoff = cutoff;
        self
    }

    /// Set the majority age
    #[must_use]
    pub const fn majority_age(mut self, age: u8) -> Self {
        self.event.majority_age = Some(age);
        self
    }

    /// Require a promo code
    #[must_use]
    pub const fn requires_promo_code(mut self) -> Self {
        self.event.requires_promo_code = true;
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> Event {
        self.event
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Valid ticket payload with an e-mail contact
#[must_use]
pub fn ticket(first_name: &str, age: u8) -> TicketInput {
    TicketInput {
        first_name: first_name.to_string(),
        last_name: "Lovelace".to_string(),
        age: Some(age),
        contact: Contact {
            email: Some(format!("{}@example.com", first_name.to_lowercase())),
            phone: None,
            whatsapp: None,
        },
        ticket_type: TicketType::Student,
    }
}

/// Valid ticket payload for an adult
#[must_use]
pub fn adult(first_name: &str) -> TicketInput {
    ticket(first_name, 19)
}

/// Valid ticket payload for a 15-year-old
#[must_use]
pub fn minor(first_name: &str) -> TicketInput {
    ticket(first_name, 15)
}

/// Valid guardian payload
#[must_use]
pub fn guardian() -> GuardianInput {
    GuardianInput {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        contact: Contact {
            email: Some("grace@example.com".to_string()),
            phone: Some("+12065550100".to_string()),
            whatsapp: None,
        },
    }
}

/// Promo code for an event
#[must_use]
pub fn promo(event_id: EventId, code: &str, discount: Discount, uses: Option<u32>) -> PromoCode {
    PromoCode {
        id: PromoCodeId::new(),
        event_id,
        code: code.to_string(),
        discount,
        uses,
        metadata: serde_json::json!({}),
    }
}

/// Card-gateway request without guardian or promo
#[must_use]
pub fn request(event_id: EventId, tickets: Vec<TicketInput>) -> RegistrationRequest {
    RegistrationRequest {
        event_id,
        tickets,
        guardian: None,
        promo_code: None,
        provider: PaymentProvider::Stripe,
    }
}
