use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A physical parking space. Occupancy is a denormalized pointer at the
/// ticket currently parked here; `None` means vacant. `position` is the
/// numeric sort key behind the generated "Slot N" names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Slot {
    pub id: Uuid,
    pub name: String,
    pub section: String,
    pub position: i32,
    pub ticket_occupation: Option<Uuid>,
}
