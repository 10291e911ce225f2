//! Ticket and guardian payload validation.
//!
//! Validators collect every problem instead of stopping at the first one, so the
//! registrant can fix the whole form in one pass.

use crate::error::RegistrationError;
use crate::types::{Contact, Event, GuardianInput, TicketInput};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
});

static PHONE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]*$").ok());

/// Minimum digits in a phone number (national number without country code)
const MIN_PHONE_DIGITS: usize = 10;
/// Maximum digits allowed by E.164
const MAX_PHONE_DIGITS: usize = 15;

/// Validate email format.
///
/// # Examples
///
/// ```
/// use registrar_core::validation::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@sub.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 254 {
        return false;
    }

    let Some((local, _)) = email.split_once('@') else {
        return false;
    };

    // No leading, trailing or doubled dots in the local part
    if local.len() > 64 || local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Validate phone number format.
///
/// Accepts common separators and an optional leading `+`; requires 10 to 15 digits.
///
/// # Examples
///
/// ```
/// use registrar_core::validation::is_valid_phone;
///
/// assert!(is_valid_phone("+1 (206) 555-0100"));
/// assert!(is_valid_phone("2065550100"));
/// assert!(!is_valid_phone("555-0100"));
/// assert!(!is_valid_phone("call me"));
/// ```
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    if !PHONE_RE.as_ref().is_some_and(|re| re.is_match(phone)) {
        return false;
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

fn present(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

fn validate_contact(contact: &Contact, errors: &mut Vec<String>) {
    if let Some(email) = present(contact.email.as_deref()) {
        if !is_valid_email(email) {
            errors.push(format!("{email} is not a valid email."));
        }
    }
    for number in [contact.phone.as_deref(), contact.whatsapp.as_deref()] {
        if let Some(number) = present(number) {
            if !is_valid_phone(number) {
                errors.push(format!("{number} is not a valid phone number."));
            }
        }
    }
}

/// Problems with one ticket payload, in display order.
#[must_use]
pub fn validate_ticket(event: &Event, ticket: &TicketInput) -> Vec<String> {
    let mut errors = Vec::new();
    let min_age = event.min_age();
    let max_age = event.max_age();

    match ticket.age {
        None | Some(0) => errors.push("Age is required".to_string()),
        Some(age) if age < min_age => {
            errors.push(format!("You must be at least {min_age} to participate."));
        }
        Some(age) if age > max_age => {
            errors.push(format!("You must be under {max_age} to participate."));
        }
        Some(_) => {}
    }

    if ticket.first_name.trim().is_empty() || ticket.last_name.trim().is_empty() {
        errors.push("Name is required.".to_string());
    }
    if ticket.contact.is_empty() {
        errors.push("Email or phone is required.".to_string());
    }
    validate_contact(&ticket.contact, &mut errors);

    errors
}

/// Problems with the guardian payload, in display order.
#[must_use]
pub fn validate_guardian(guardian: &GuardianInput) -> Vec<String> {
    let mut errors = Vec::new();

    if guardian.first_name.trim().is_empty() || guardian.last_name.trim().is_empty() {
        errors.push("Guardian name is required.".to_string());
    }
    if guardian.contact.is_empty() {
        errors.push("Guardian email or phone is required.".to_string());
    }
    validate_contact(&guardian.contact, &mut errors);

    errors
}

/// Validates every ticket in a request.
///
/// # Errors
///
/// Returns [`RegistrationError::ValidationFailed`] carrying all problems found, or a
/// single message when no tickets were supplied.
pub fn validate_tickets(event: &Event, tickets: &[TicketInput]) -> Result<(), RegistrationError> {
    if tickets.is_empty() {
        return Err(RegistrationError::ValidationFailed(vec![
            "Must provide a ticket.".to_string(),
        ]));
    }

    let errors: Vec<String> = tickets
        .iter()
        .flat_map(|ticket| validate_ticket(event, ticket))
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(RegistrationError::ValidationFailed(errors)) }
}

/// Enforces the guardian requirement for minors and validates guardian data if given.
///
/// # Errors
///
/// - [`RegistrationError::GuardianRequired`] if a minor is present and no guardian was sent
/// - [`RegistrationError::ValidationFailed`] if the guardian payload has problems
pub fn check_guardian(
    event: &Event,
    tickets: &[TicketInput],
    guardian: Option<&GuardianInput>,
) -> Result<(), RegistrationError> {
    let majority = event.majority_age();
    let has_minor = tickets.iter().any(|ticket| ticket.is_minor(majority));

    match guardian {
        None if has_minor => Err(RegistrationError::GuardianRequired),
        None => Ok(()),
        Some(guardian) => {
            let errors = validate_guardian(guardian);
            if errors.is_empty() { Ok(()) } else { Err(RegistrationError::ValidationFailed(errors)) }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventId, Money};
    use chrono::Utc;

    fn event() -> Event {
        Event {
            id: EventId::new(),
            name: "Spring Hack".to_string(),
            region_webname: "seattle".to_string(),
            venue: None,
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

    fn ticket(age: Option<u8>) -> TicketInput {
        TicketInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age,
            contact: Contact { email: Some("ada@example.com".to_string()), ..Contact::default() },
            ..TicketInput::default()
        }
    }

    #[test]
    fn test_valid_ticket() {
        assert!(validate_ticket(&event(), &ticket(Some(16))).is_empty());
    }

    #[test]
    fn test_age_bounds_use_defaults() {
        assert_eq!(validate_ticket(&event(), &ticket(None)), vec!["Age is required"]);
        assert_eq!(
            validate_ticket(&event(), &ticket(Some(11))),
            vec!["You must be at least 12 to participate."]
        );
        assert_eq!(
            validate_ticket(&event(), &ticket(Some(26))),
            vec!["You must be under 25 to participate."]
        );
    }

    #[test]
    fn test_collects_all_problems() {
        let input = TicketInput {
            contact: Contact {
                email: Some("nope".to_string()),
                phone: Some("12".to_string()),
                whatsapp: None,
            },
            ..ticket(Some(15))
        };
        let input = TicketInput { last_name: String::new(), ..input };
        assert_eq!(
            validate_ticket(&event(), &input),
            vec![
                "Name is required.",
                "nope is not a valid email.",
                "12 is not a valid phone number.",
            ]
        );
    }

    #[test]
    fn test_missing_contact() {
        let input = TicketInput { contact: Contact::default(), ..ticket(Some(15)) };
        assert_eq!(validate_ticket(&event(), &input), vec!["Email or phone is required."]);
    }

    #[test]
    fn test_empty_request() {
        let err = validate_tickets(&event(), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Must provide a ticket.");
    }

    #[test]
    fn test_minor_without_guardian() {
        let tickets = vec![ticket(Some(15))];
        assert!(matches!(
            check_guardian(&event(), &tickets, None),
            Err(RegistrationError::GuardianRequired)
        ));
        assert!(check_guardian(&event(), &[ticket(Some(18))], None).is_ok());
    }

    #[test]
    fn test_guardian_validation() {
        let guardian = GuardianInput {
            first_name: "Grace".to_string(),
            last_name: String::new(),
            contact: Contact::default(),
        };
        let err = check_guardian(&event(), &[ticket(Some(15))], Some(&guardian)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Guardian name is required. Guardian email or phone is required."
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("first.last@example.co.uk"));
        assert!(!is_valid_email("first..last@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("two@@example.com"));
    }
}
