use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recorded infraction against a ticket. Each one adds a flat surcharge
/// to the due amount while the ticket stays unpaid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Violation {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub date_occurred: DateTime<Utc>,
    pub reason: String,
    pub user_id: Uuid,
}
