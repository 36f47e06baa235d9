use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical form of a webhook submission, produced by the normalizer
/// regardless of which form template or envelope shape carried it.
///
/// Only `email`, `form_id` and `invoice_no` are required downstream;
/// everything else defaults when the submission omits it. This type is
/// ephemeral — it is built per request and never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSubmission {
    pub email: String,
    pub name: String,
    pub invoice_no: String,
    pub form_id: String,
    pub phone: String,
    pub church: String,
    pub youth_ministry: String,
    pub event_name: String,
    pub event_date: String,
    pub quantity: i32,
    pub product_details: String,
    pub total_amount: Decimal,
}
