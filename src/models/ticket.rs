use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    /// External invoice number; unique, and the idempotency key for
    /// webhook deliveries.
    pub invoice_no: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub church: String,
    pub youth_ministry: String,
    pub quantity: i32,
    pub product_details: String,
    pub total_amount: Decimal,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for new tickets. Tickets always start not-checked-in;
/// id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub invoice_no: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub church: String,
    pub youth_ministry: String,
    pub quantity: i32,
    pub product_details: String,
    pub total_amount: Decimal,
}
