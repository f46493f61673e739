use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A settled ticket's payment record. At most one per ticket; the `price`
/// is the computed due amount, not the tendered cash.
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub date_occurred: DateTime<Utc>,
    pub price: Decimal,
    pub method: String,
    pub reference_id: String,
}
