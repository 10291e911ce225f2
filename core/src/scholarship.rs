//! Scholarship disposition rules.
//!
//! A scholarship request is approved, rejected with a fixed message, or forwarded to
//! staff, depending only on the stated reason.

use crate::types::{EventId, GuardianInput, TicketInput};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reason a registrant gives for needing a fee waiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScholarshipReason {
    /// "I can't afford it"
    CantAfford,
    /// "My family can't afford it"
    FamilyCantAfford,
    /// "I'm not sure my family can afford it"
    FamilyUnsure,
    /// "I don't believe I should have to pay"
    DontBelievePay,
    /// Free-text reason
    Other,
}

impl ScholarshipReason {
    /// Storage tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CantAfford => "CANT_AFFORD",
            Self::FamilyCantAfford => "FAMILY_CANT_AFFORD",
            Self::FamilyUnsure => "FAMILY_UNSURE",
            Self::DontBelievePay => "DONT_BELIEVE_PAY",
            Self::Other => "OTHER",
        }
    }
}

/// What happens to a scholarship request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Issue free tickets after a delay
    Approve,
    /// Send this decline reason after a delay
    Reject(&'static str),
    /// Hand to staff
    Forward,
}

impl Disposition {
    /// Metrics label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject(_) => "rejected",
            Self::Forward => "forwarded",
        }
    }
}

/// Decline reason for a family that has not confirmed it can't pay
pub const FAMILY_UNSURE_DECLINE: &str = "we have a limited number of scholarship tickets and can't offer them unless you confirm you can't afford it.";
/// Decline reason for registrants who object to paying
pub const DONT_BELIEVE_PAY_DECLINE: &str =
    "we're a small nonprofit and don't have the budget to offer everyone free tickets.";

/// Maps a reason to its disposition.
#[must_use]
pub const fn disposition(reason: ScholarshipReason) -> Disposition {
    match reason {
        ScholarshipReason::CantAfford | ScholarshipReason::FamilyCantAfford => Disposition::Approve,
        ScholarshipReason::FamilyUnsure => Disposition::Reject(FAMILY_UNSURE_DECLINE),
        ScholarshipReason::DontBelievePay => Disposition::Reject(DONT_BELIEVE_PAY_DECLINE),
        ScholarshipReason::Other => Disposition::Forward,
    }
}

/// A request to waive the ticket fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipRequest {
    /// Event to register for
    pub event_id: EventId,
    /// Participants
    pub tickets: Vec<TicketInput>,
    /// Guardian data for minors
    #[serde(default)]
    pub guardian: Option<GuardianInput>,
    /// Stated reason
    pub reason: ScholarshipReason,
    /// Free text accompanying the reason
    #[serde(default)]
    pub reason_other: Option<String>,
}

impl ScholarshipRequest {
    /// Reason code followed by free text, for staff
    #[must_use]
    pub fn reason_summary(&self) -> String {
        match self.reason_other.as_deref().map(str::trim) {
            Some(other) if !other.is_empty() => format!("{} {other}", self.reason.as_str()),
            _ => self.reason.as_str().to_string(),
        }
    }
}

/// Jitter window for a deferred disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    /// Shortest delay
    pub min: Duration,
    /// Longest delay
    pub max: Duration,
}

impl DelayWindow {
    /// Window between `min` and `max` seconds (swapped if reversed)
    #[must_use]
    pub const fn from_secs(min: u64, max: u64) -> Self {
        if min <= max {
            Self { min: Duration::from_secs(min), max: Duration::from_secs(max) }
        } else {
            Self { min: Duration::from_secs(max), max: Duration::from_secs(min) }
        }
    }
}

/// Delay windows for rejections and approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispositionDelays {
    /// Before a rejection is sent (default 30 to 60 minutes)
    pub rejection: DelayWindow,
    /// Before approved tickets are issued (default 5 to 10 minutes)
    pub approval: DelayWindow,
}

impl Default for DispositionDelays {
    fn default() -> Self {
        Self {
            rejection: DelayWindow::from_secs(30 * 60, 60 * 60),
            approval: DelayWindow::from_secs(5 * 60, 10 * 60),
        }
    }
}

/// Participant-facing wording, parameterised by the organization name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScholarshipWording {
    /// Organization name used in messages (empty = omitted)
    pub organization: String,
}

impl ScholarshipWording {
    fn scholarship(&self) -> String {
        if self.organization.trim().is_empty() {
            "scholarship".to_string()
        } else {
            format!("{} scholarship", self.organization.trim())
        }
    }

    /// E-mail subject used for every participant message
    #[must_use]
    pub fn subject(&self) -> String {
        let organization = self.organization.trim();
        if organization.is_empty() {
            "Scholarship Request".to_string()
        } else {
            format!("{organization} Scholarship Request")
        }
    }

    /// Decline text
    #[must_use]
    pub fn rejection(&self, decline: &str) -> String {
        format!(
            "Unfortunately we aren't able to offer you a {} because {decline}",
            self.scholarship()
        )
    }

    /// Approval text
    #[must_use]
    pub fn approval(&self) -> String {
        format!(
            "We approved your {} request. Your ticket information will be sent separately.",
            self.scholarship()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_table() {
        assert_eq!(disposition(ScholarshipReason::CantAfford), Disposition::Approve);
        assert_eq!(disposition(ScholarshipReason::FamilyCantAfford), Disposition::Approve);
        assert_eq!(
            disposition(ScholarshipReason::FamilyUnsure),
            Disposition::Reject(FAMILY_UNSURE_DECLINE)
        );
        assert_eq!(
            disposition(ScholarshipReason::DontBelievePay),
            Disposition::Reject(DONT_BELIEVE_PAY_DECLINE)
        );
        assert_eq!(disposition(ScholarshipReason::Other), Disposition::Forward);
    }

    #[test]
    fn test_reason_deserializes_from_tag() {
        let reason: Result<ScholarshipReason, _> = serde_json::from_str("\"FAMILY_CANT_AFFORD\"");
        assert!(matches!(reason, Ok(ScholarshipReason::FamilyCantAfford)));
    }

    #[test]
    fn test_wording() {
        let wording = ScholarshipWording { organization: "Hack Club".to_string() };
        assert_eq!(wording.subject(), "Hack Club Scholarship Request");
        assert!(wording
            .rejection(DONT_BELIEVE_PAY_DECLINE)
            .starts_with("Unfortunately we aren't able to offer you a Hack Club scholarship because we're"));

        let plain = ScholarshipWording { organization: String::new() };
        assert_eq!(plain.subject(), "Scholarship Request");
        assert_eq!(
            plain.approval(),
            "We approved your scholarship request. Your ticket information will be sent separately."
        );
    }

    #[test]
    fn test_delay_window_orders_bounds() {
        let window = DelayWindow::from_secs(600, 300);
        assert_eq!(window.min, Duration::from_secs(300));
        assert_eq!(window.max, Duration::from_secs(600));
    }
}
