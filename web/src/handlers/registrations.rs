//! Registration endpoints.
//!
//! - `POST /api/events/:id/registrations` registers one or more participants
//! - `GET /api/events/:id/promo-codes/:code` previews a promo code
//! - `GET /api/events/:id/remaining-tickets` reports remaining seats, exact for callers
//!   presenting the staff token in [`STAFF_TOKEN_HEADER`]

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use registrar_core::admission::Audience;
use registrar_core::promo::PromoCheck;
use registrar_core::{EventId, GuardianInput, PaymentProvider, RegistrationRequest, TicketInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration payload. Accepts a single `ticket` or a `tickets` array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationBody {
    /// Single participant
    #[serde(default)]
    pub ticket: Option<TicketInput>,
    /// Several participants
    #[serde(default)]
    pub tickets: Option<Vec<TicketInput>>,
    /// Guardian for minors
    #[serde(default)]
    pub guardian: Option<GuardianInput>,
    /// Promo code text
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Gateway chosen by the client (card gateway when omitted)
    #[serde(default)]
    pub provider: Option<PaymentProvider>,
}

/// Participants from either form of the payload, `tickets` first.
pub(crate) fn participants(ticket: Option<TicketInput>, tickets: Option<Vec<TicketInput>>) -> Vec<TicketInput> {
    match tickets {
        Some(tickets) if !tickets.is_empty() => tickets,
        _ => ticket.into_iter().collect(),
    }
}

impl RegistrationBody {
    /// Request for `event_id`
    #[must_use]
    pub fn into_request(self, event_id: EventId) -> RegistrationRequest {
        RegistrationRequest {
            event_id,
            tickets: participants(self.ticket, self.tickets),
            guardian: self.guardian,
            promo_code: self.promo_code.filter(|code| !code.trim().is_empty()),
            provider: self.provider.unwrap_or_default(),
        }
    }
}

/// Registration outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// Gateway client reference to complete payment with; `null` for free registrations
    pub payment_reference: Option<String>,
}

/// `POST /api/events/:id/registrations`
///
/// # Errors
///
/// Maps every [`RegistrationError`](registrar_core::RegistrationError) through [`AppError`].
pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<RegistrationBody>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let request = body.into_request(EventId::from_uuid(event_id));
    let payment_reference = state.registrar.register_for_event(request).await?;
    Ok(Json(RegistrationResponse { payment_reference }))
}

/// `GET /api/events/:id/promo-codes/:code`
///
/// # Errors
///
/// 404 for an unknown event.
pub async fn check_promo_code(
    State(state): State<AppState>,
    Path((event_id, code)): Path<(Uuid, String)>,
) -> Result<Json<PromoCheck>, AppError> {
    let check = state
        .registrar
        .check_promo_code(EventId::from_uuid(event_id), &code)
        .await?;
    Ok(Json(check))
}

/// Header carrying the staff token
pub const STAFF_TOKEN_HEADER: &str = "X-Staff-Token";

/// Staff only when a token is configured and the request presents exactly that token.
fn audience(staff_token: Option<&str>, headers: &HeaderMap) -> Audience {
    let presented = headers.get(STAFF_TOKEN_HEADER).and_then(|value| value.to_str().ok());
    match (staff_token, presented) {
        (Some(expected), Some(presented)) if presented == expected => Audience::Staff,
        _ => Audience::Public,
    }
}

/// Remaining seats.
#[derive(Debug, Serialize)]
pub struct RemainingResponse {
    /// `null` when the venue capacity is unknown
    pub remaining: Option<u32>,
}

/// `GET /api/events/:id/remaining-tickets`
///
/// # Errors
///
/// 404 for an unknown event.
pub async fn remaining_tickets(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<RemainingResponse>, AppError> {
    let audience = audience(state.staff_token.as_deref(), &headers);
    let remaining = state
        .registrar
        .remaining_tickets(EventId::from_uuid(event_id), audience)
        .await?;
    Ok(Json(RemainingResponse { remaining }))
}
