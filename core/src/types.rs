//! Domain types for event registration.
//!
//! Value objects (identifiers, [`Money`], [`Currency`]), persisted entities
//! ([`Event`], [`Venue`], [`PromoCode`], [`Ticket`], [`Payment`], [`Person`]) and the
//! request payloads accepted by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an event
    EventId
);
define_id!(
    /// Unique identifier for a venue
    VenueId
);
define_id!(
    /// Unique identifier for a promo code
    PromoCodeId
);
define_id!(
    /// Unique identifier for a ticket
    TicketId
);
define_id!(
    /// Unique identifier for a payment attempt
    PaymentId
);
define_id!(
    /// Unique identifier for a person (guardian)
    PersonId
);

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// Money in minor currency units (cents, paise).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole major units with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts, flooring at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Applies a percentage discount expressed in basis points (1% = 100).
    ///
    /// The result is rounded half-up to the minor unit and never negative.
    #[must_use]
    pub const fn apply_percent_discount(self, basis_points: u32) -> Self {
        if basis_points >= 10_000 {
            return Self::ZERO;
        }
        let keep = (10_000 - basis_points) as u128;
        let scaled = self.0 as u128 * keep;
        #[allow(clippy::cast_possible_truncation)] // scaled / 10_000 <= self.0
        let rounded = ((scaled + 5_000) / 10_000) as u64;
        Self(rounded)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// ISO-4217 currency code, stored lower-case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Creates a currency from any-case code text
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_lowercase())
    }

    /// US dollar
    #[must_use]
    pub fn usd() -> Self {
        Self("usd".to_string())
    }

    /// Indian rupee
    #[must_use]
    pub fn inr() -> Self {
        Self("inr".to_string())
    }

    /// Lower-case code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-case code
    #[must_use]
    pub fn to_uppercase(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Payment providers
// ============================================================================

/// Tag selecting a payment back-end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Card-based gateway (Stripe)
    #[default]
    Stripe,
    /// Regional gateway (Razorpay)
    Razorpay,
}

impl PaymentProvider {
    /// Stable string form used in storage and URLs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Razorpay => "razorpay",
        }
    }

    /// Currency charged when the region does not specify one
    #[must_use]
    pub fn default_currency(&self) -> Currency {
        match self {
            Self::Stripe => Currency::usd(),
            Self::Razorpay => Currency::inr(),
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an unknown provider tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for PaymentProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe),
            "razorpay" => Ok(Self::Razorpay),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

// ============================================================================
// Events & venues
// ============================================================================

/// Default minimum participant age
pub const DEFAULT_MIN_AGE: u8 = 12;
/// Default maximum participant age
pub const DEFAULT_MAX_AGE: u8 = 25;
/// Default age of majority
pub const DEFAULT_MAJORITY_AGE: u8 = 18;

/// A venue hosting an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Venue ID
    pub id: VenueId,
    /// Display name
    pub name: String,
    /// Seat capacity (`None` = unknown)
    pub capacity: Option<u32>,
}

/// A ticketed event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Region webname, the key into the regional content service
    pub region_webname: String,
    /// Assigned venue
    pub venue: Option<Venue>,
    /// Standard ticket price
    pub ticket_price: Money,
    /// Early-bird ticket price
    pub early_bird_price: Option<Money>,
    /// Early-bird price is active strictly before this instant
    pub early_bird_cutoff: Option<DateTime<Utc>>,
    /// Master switch for registrations
    pub registrations_open: bool,
    /// Registrations close after this instant
    pub registration_cutoff: DateTime<Utc>,
    /// Minimum participant age
    pub min_age: Option<u8>,
    /// Maximum participant age
    pub max_age: Option<u8>,
    /// Participants younger than this need a guardian
    pub majority_age: Option<u8>,
    /// A promo code must be supplied to register
    pub requires_promo_code: bool,
}

impl Event {
    /// Effective minimum age
    #[must_use]
    pub fn min_age(&self) -> u8 {
        self.min_age.unwrap_or(DEFAULT_MIN_AGE)
    }

    /// Effective maximum age
    #[must_use]
    pub fn max_age(&self) -> u8 {
        self.max_age.unwrap_or(DEFAULT_MAX_AGE)
    }

    /// Effective age of majority
    #[must_use]
    pub fn majority_age(&self) -> u8 {
        self.majority_age.unwrap_or(DEFAULT_MAJORITY_AGE)
    }

    /// Venue capacity, if both venue and capacity are known
    #[must_use]
    pub fn capacity(&self) -> Option<u32> {
        self.venue.as_ref().and_then(|venue| venue.capacity)
    }
}

// ============================================================================
// Promo codes
// ============================================================================

/// How a promo code changes the price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Subtract a fixed amount
    Subtract(Money),
    /// Take a percentage off, in basis points (1% = 100)
    Percent(u32),
}

impl Discount {
    /// Storage tag (`SUBTRACT` / `PERCENT`)
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Subtract(_) => "SUBTRACT",
            Self::Percent(_) => "PERCENT",
        }
    }

    /// Raw amount (minor units or basis points)
    #[must_use]
    pub const fn raw_amount(&self) -> u64 {
        match self {
            Self::Subtract(money) => money.cents(),
            Self::Percent(bp) => *bp as u64,
        }
    }

    /// Human display, e.g. `10%`, `12.5%` or `$5.00`
    #[must_use]
    pub fn display_amount(&self) -> String {
        match self {
            Self::Subtract(money) => money.to_string(),
            Self::Percent(bp) if bp % 100 == 0 => format!("{}%", bp / 100),
            Self::Percent(bp) => {
                let fraction = format!("{:02}", bp % 100);
                format!("{}.{}%", bp / 100, fraction.trim_end_matches('0'))
            }
        }
    }
}

/// A promo code belonging to one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Promo code ID
    pub id: PromoCodeId,
    /// Owning event
    pub event_id: EventId,
    /// Code text as entered by staff
    pub code: String,
    /// Discount applied
    pub discount: Discount,
    /// Maximum redemptions (`None` = unlimited)
    pub uses: Option<u32>,
    /// Free-form metadata returned with promo checks
    pub metadata: serde_json::Value,
}

/// A promo code together with its current redemption count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RedeemablePromo {
    /// The promo code
    pub code: PromoCode,
    /// Number of tickets currently referencing the code
    pub redemptions: u32,
}

impl RedeemablePromo {
    /// Remaining uses (`None` = unlimited)
    #[must_use]
    pub fn uses_remaining(&self) -> Option<u32> {
        self.code
            .uses
            .map(|max| max.saturating_sub(self.redemptions))
    }

    /// Whether at least one more redemption is allowed
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.uses_remaining().is_none_or(|remaining| remaining > 0)
    }
}

// ============================================================================
// People, tickets, payments
// ============================================================================

/// Contact methods. At least one is required for tickets and guardians.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// E-mail address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number (SMS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// WhatsApp number
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "whatsApp", alias = "whatsapp")]
    pub whatsapp: Option<String>,
}

impl Contact {
    /// Whether no contact method is present (blank strings count as absent)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.email, &self.phone, &self.whatsapp]
            .iter()
            .all(|field| field.as_deref().is_none_or(|value| value.trim().is_empty()))
    }
}

/// Kind of ticket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    /// Participant
    #[default]
    Student,
    /// Teacher / chaperone
    Teacher,
    /// Volunteer
    Volunteer,
    /// Mentor
    Mentor,
    /// Judge
    Judge,
    /// Organizing staff
    Staff,
}

impl TicketType {
    /// Storage tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Volunteer => "VOLUNTEER",
            Self::Mentor => "MENTOR",
            Self::Judge => "JUDGE",
            Self::Staff => "STAFF",
        }
    }
}

impl FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "TEACHER" => Ok(Self::Teacher),
            "VOLUNTEER" => Ok(Self::Volunteer),
            "MENTOR" => Ok(Self::Mentor),
            "JUDGE" => Ok(Self::Judge),
            "STAFF" => Ok(Self::Staff),
            other => Err(format!("Invalid ticket type: {other}")),
        }
    }
}

/// Ticket payload submitted by a registrant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketInput {
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: String,
    /// Age in years
    #[serde(default)]
    pub age: Option<u8>,
    /// Contact methods
    #[serde(flatten)]
    pub contact: Contact,
    /// Ticket kind
    #[serde(default, rename = "type")]
    pub ticket_type: TicketType,
}

impl TicketInput {
    /// Whether this participant needs a guardian at the given majority age
    #[must_use]
    pub fn is_minor(&self, majority_age: u8) -> bool {
        self.age.is_some_and(|age| age < majority_age)
    }
}

/// Guardian payload submitted alongside minors' tickets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInput {
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: String,
    /// Contact methods
    #[serde(flatten)]
    pub contact: Contact,
}

/// A persisted guardian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Person ID
    pub id: PersonId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact methods
    pub contact: Contact,
}

/// A persisted ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket ID
    pub id: TicketId,
    /// Event the ticket is for
    pub event_id: EventId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Age in years
    pub age: Option<u8>,
    /// Contact methods
    pub contact: Contact,
    /// Ticket kind
    pub ticket_type: TicketType,
    /// Guardian (minors only)
    pub guardian_id: Option<PersonId>,
    /// Payment attempt the ticket belongs to
    pub payment_id: Option<PaymentId>,
    /// Promo code redeemed by the ticket
    pub promo_code_id: Option<PromoCodeId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One payment attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID
    pub id: PaymentId,
    /// Provider that owns the intent
    pub provider: PaymentProvider,
    /// Provider-native intent / order ID
    pub intent_id: String,
    /// Set once the gateway confirms payment
    pub complete: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Requests
// ============================================================================

/// A request to register one or more participants for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Event to register for
    pub event_id: EventId,
    /// One payload per requested ticket
    pub tickets: Vec<TicketInput>,
    /// Guardian data (required when any participant is a minor)
    pub guardian: Option<GuardianInput>,
    /// Promo code text as entered
    pub promo_code: Option<String>,
    /// Payment back-end chosen by the client
    pub provider: PaymentProvider,
}
