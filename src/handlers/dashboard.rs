use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::auth;
use crate::models::{ActivityLevel, TicketStatus};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::time::{format_display, local_day_range, time_ago};

#[derive(FromRow)]
struct LatestActivityRow {
    date_occurred: DateTime<Utc>,
    description: String,
    level: ActivityLevel,
    plate_number: String,
}

#[derive(Serialize)]
struct LatestActivity {
    time_ago: String,
    description: String,
    level: ActivityLevel,
    plate_number: String,
}

#[derive(Serialize)]
struct DashboardPayload {
    total_slots: i64,
    occupied_slots: i64,
    active_tickets: i64,
    daily_revenue: Decimal,
    current_visitors: i64,
    latest_park_activities: Vec<LatestActivity>,
}

/// `GET /api/dashboard` — the landing page counters plus the three most
/// recent audit entries.
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let (total_slots, occupied_slots): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(ticket_occupation) FROM slots",
    )
    .fetch_one(&state.pool)
    .await?;

    let active_tickets: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE status = $1")
            .bind(TicketStatus::Unpaid)
            .fetch_one(&state.pool)
            .await?;

    let now = Utc::now();
    let (today_start, today_end) = local_day_range(now, state.display_offset(), 0);

    let daily_revenue: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(price), 0) FROM payments \
         WHERE date_occurred >= $1 AND date_occurred < $2",
    )
    .bind(today_start)
    .bind(today_end)
    .fetch_one(&state.pool)
    .await?;

    let current_visitors: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tickets WHERE date_occupied >= $1 AND date_occupied < $2",
    )
    .bind(today_start)
    .bind(today_end)
    .fetch_one(&state.pool)
    .await?;

    let latest = sqlx::query_as::<_, LatestActivityRow>(
        "SELECT pa.date_occurred, pa.description, pa.level, t.plate_number \
         FROM park_activities pa INNER JOIN tickets t ON t.id = pa.ticket_id \
         ORDER BY pa.date_occurred DESC LIMIT 3",
    )
    .fetch_all(&state.pool)
    .await?;

    let payload = DashboardPayload {
        total_slots,
        occupied_slots,
        active_tickets,
        daily_revenue,
        current_visitors,
        latest_park_activities: latest
            .into_iter()
            .map(|row| LatestActivity {
                time_ago: time_ago(row.date_occurred, now),
                description: row.description,
                level: row.level,
                plate_number: row.plate_number,
            })
            .collect(),
    };

    Ok(success(payload, "Dashboard fetched.").into_response())
}

#[derive(FromRow)]
struct ReportJoinRow {
    date_occurred: DateTime<Utc>,
    description: String,
    level: ActivityLevel,
    plate_number: String,
    customer_name: String,
}

#[derive(Serialize)]
struct ReportRow {
    date: String,
    description: String,
    level: ActivityLevel,
    plate_number: String,
    customer_name: String,
}

/// `GET /api/dashboard/reports` — the full audit trail, newest first.
pub async fn reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let rows = sqlx::query_as::<_, ReportJoinRow>(
        "SELECT pa.date_occurred, pa.description, pa.level, t.plate_number, t.customer_name \
         FROM park_activities pa INNER JOIN tickets t ON t.id = pa.ticket_id \
         ORDER BY pa.date_occurred DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let offset = state.display_offset();
    let report: Vec<ReportRow> = rows
        .into_iter()
        .map(|row| ReportRow {
            date: format_display(row.date_occurred, offset),
            description: row.description,
            level: row.level,
            plate_number: row.plate_number,
            customer_name: row.customer_name,
        })
        .collect();

    Ok(success(report, "Reports fetched.").into_response())
}
