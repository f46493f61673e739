use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Severity tag on an audit entry, rendered as a badge by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Danger,
}

/// Append-only audit trail entry tied to a ticket.
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParkActivity {
    pub id: Uuid,
    pub date_occurred: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub description: String,
    pub level: ActivityLevel,
    pub user_id: Uuid,
}

impl ParkActivity {
    /// Appends one entry to the trail. Takes any executor so mutations can
    /// record inside their own transaction.
    pub async fn record<'e, E>(
        executor: E,
        ticket_id: Uuid,
        description: &str,
        level: ActivityLevel,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO park_activities (id, date_occurred, ticket_id, description, level, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(ticket_id)
        .bind(description)
        .bind(level)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
