//! Promo code resolution and preview.

use crate::pricing::{active_price, apply_discount};
use crate::store::{RegistrationStore, StoreError};
use crate::types::{Event, EventId, Money, RedeemablePromo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalizes code text for matching: trimmed and lower-cased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Picks the first candidate that still has uses left.
///
/// Candidates arrive in store order (creation time, then id). When several codes
/// share a text the first available one wins, not the best discount.
#[must_use]
pub fn select_promo(candidates: Vec<RedeemablePromo>) -> Option<RedeemablePromo> {
    candidates.into_iter().find(RedeemablePromo::is_available)
}

/// Resolves a usable promo code for an event.
///
/// Blank or absent code text resolves to `None` without touching the store.
///
/// # Errors
///
/// Returns [`StoreError`] if the lookup fails.
pub async fn resolve(
    store: &dyn RegistrationStore,
    event_id: EventId,
    code: Option<&str>,
) -> Result<Option<RedeemablePromo>, StoreError> {
    let Some(code) = code.map(normalize_code).filter(|code| !code.is_empty()) else {
        return Ok(None);
    };

    let candidates = store.find_promo_codes(event_id, &code).await?;
    Ok(select_promo(candidates))
}

/// Read-only preview of what a promo code would do for a registrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCheck {
    /// Whether the code would be applied
    pub valid: bool,
    /// Upper-cased code text
    pub display_discount_name: Option<String>,
    /// Human discount, e.g. `10%` or `$5.00`
    pub display_discount_amount: Option<String>,
    /// `SUBTRACT` or `PERCENT`
    pub discount_type: Option<String>,
    /// Raw discount amount (minor units or basis points)
    pub discount_amount: Option<u64>,
    /// Unit price after the code, or the undiscounted price when invalid
    pub effective_price: Option<Money>,
    /// Remaining uses (`None` = unlimited or invalid)
    pub remaining_uses: Option<u32>,
    /// Code metadata
    pub metadata: serde_json::Value,
}

impl PromoCheck {
    /// Builds the preview for an already-resolved promo code.
    #[must_use]
    pub fn evaluate(event: &Event, promo: Option<&RedeemablePromo>, now: DateTime<Utc>) -> Self {
        let price = active_price(event, now);

        match (promo, price) {
            (Some(promo), Some(price))
                if promo.is_available() && promo.code.event_id == event.id =>
            {
                let discount = promo.code.discount;
                Self {
                    valid: true,
                    display_discount_name: Some(promo.code.code.to_uppercase()),
                    display_discount_amount: Some(discount.display_amount()),
                    discount_type: Some(discount.type_name().to_string()),
                    discount_amount: Some(discount.raw_amount()),
                    effective_price: Some(apply_discount(price, discount)),
                    remaining_uses: promo.uses_remaining(),
                    metadata: promo.code.metadata.clone(),
                }
            }
            _ => Self::invalid(price),
        }
    }

    /// Preview for a code that would not apply
    #[must_use]
    pub fn invalid(effective_price: Option<Money>) -> Self {
        Self {
            valid: false,
            display_discount_name: None,
            display_discount_amount: None,
            discount_type: None,
            discount_amount: None,
            effective_price,
            remaining_uses: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}
