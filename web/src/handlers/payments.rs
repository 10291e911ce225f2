//! Payment finalization and withdrawal.
//!
//! - `POST /api/payments/:provider/:intent_id/finalize`
//! - `POST /api/payments/:provider/:intent_id/withdraw`

use crate::error::AppError;
use crate::extractors::PaymentPath;
use crate::state::AppState;
use axum::{Json, extract::State};
use registrar_core::TicketId;
use serde::Serialize;

/// Tickets confirmed by finalization.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    /// Every ticket attached to the intent
    pub ticket_ids: Vec<TicketId>,
}

/// Finalize a paid intent and send its ticket notices.
///
/// # Errors
///
/// 409 `PAYMENT_INCOMPLETE` while the gateway has not confirmed the payment.
pub async fn finalize(
    State(state): State<AppState>,
    path: PaymentPath,
) -> Result<Json<FinalizeResponse>, AppError> {
    let ticket_ids = state
        .registrar
        .finalize_payment(&path.intent_id, path.provider)
        .await?;
    Ok(Json(FinalizeResponse { ticket_ids }))
}

/// Withdrawal outcome.
#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    /// Always `true` on success
    pub withdrawn: bool,
}

/// Release the tickets of an abandoned intent.
///
/// # Errors
///
/// 409 `ALREADY_PAID` if the gateway reports the intent as paid.
pub async fn withdraw(
    State(state): State<AppState>,
    path: PaymentPath,
) -> Result<Json<WithdrawResponse>, AppError> {
    let withdrawn = state
        .registrar
        .withdraw_failed_payment(&path.intent_id, path.provider)
        .await?;
    Ok(Json(WithdrawResponse { withdrawn }))
}
