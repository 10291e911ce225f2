//! `POST /api/events/:id/scholarships`

use super::registrations::participants;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use registrar_core::scholarship::{ScholarshipReason, ScholarshipRequest};
use registrar_core::{EventId, GuardianInput, TicketInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scholarship payload. Participants come as `ticket` or `tickets`, like registrations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipBody {
    /// Single participant
    #[serde(default)]
    pub ticket: Option<TicketInput>,
    /// Several participants
    #[serde(default)]
    pub tickets: Option<Vec<TicketInput>>,
    /// Guardian for minors
    #[serde(default)]
    pub guardian: Option<GuardianInput>,
    /// Stated reason
    pub reason: ScholarshipReason,
    /// Free text for `OTHER`
    #[serde(default)]
    pub reason_other: Option<String>,
}

impl ScholarshipBody {
    fn into_request(self, event_id: EventId) -> ScholarshipRequest {
        ScholarshipRequest {
            event_id,
            tickets: participants(self.ticket, self.tickets),
            guardian: self.guardian,
            reason: self.reason,
            reason_other: self.reason_other,
        }
    }
}

/// Intake acknowledgement.
#[derive(Debug, Serialize)]
pub struct ScholarshipResponse {
    /// The disposition was recorded
    pub accepted: bool,
}

/// Record a scholarship request. The outcome reaches participants later.
///
/// # Errors
///
/// 400 without participants; 500 if the disposition cannot be scheduled.
pub async fn request_scholarship(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<ScholarshipBody>,
) -> Result<Json<ScholarshipResponse>, AppError> {
    let request = body.into_request(EventId::from_uuid(event_id));
    if request.tickets.is_empty() {
        return Err(AppError::bad_request("At least one ticket is required"));
    }

    let accepted = state.scholarships.request_scholarship(request).await?;
    Ok(Json(ScholarshipResponse { accepted }))
}
