use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a ticket. Transitions only move forward: an `Unpaid`
/// ticket becomes `Paid` or `Canceled`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status")]
pub enum TicketStatus {
    Unpaid,
    Paid,
    Canceled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Unpaid => "Unpaid",
            TicketStatus::Paid => "Paid",
            TicketStatus::Canceled => "Canceled",
        }
    }
}

/// A vehicle occupying a slot, priced at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub customer_name: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub date_occupied: DateTime<Utc>,
    pub is_overnight: bool,
    pub status: TicketStatus,
    pub slot_occupied: Uuid,
}

impl Ticket {
    /// Display label for the pricing mode.
    pub fn parking_mode(&self) -> &'static str {
        if self.is_overnight {
            "Overnight"
        } else {
            "Normal Parking"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parking_mode_labels() {
        let mut ticket = Ticket {
            id: Uuid::new_v4(),
            customer_name: "Ana".to_string(),
            plate_number: "ABC 123".to_string(),
            vehicle_type: "Car".to_string(),
            date_occupied: Utc::now(),
            is_overnight: true,
            status: TicketStatus::Unpaid,
            slot_occupied: Uuid::new_v4(),
        };
        assert_eq!(ticket.parking_mode(), "Overnight");
        ticket.is_overnight = false;
        assert_eq!(ticket.parking_mode(), "Normal Parking");
    }

    #[test]
    fn status_labels_match_database_enum() {
        assert_eq!(TicketStatus::Unpaid.as_str(), "Unpaid");
        assert_eq!(TicketStatus::Paid.as_str(), "Paid");
        assert_eq!(TicketStatus::Canceled.as_str(), "Canceled");
    }
}
