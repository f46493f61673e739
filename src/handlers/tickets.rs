use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::models::{ActivityLevel, ParkActivity, Ticket, TicketStatus};
use crate::pricing::{self, Quote};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::utils::time::{format_display, local_date, local_day_start};

#[derive(Serialize)]
struct TicketRow {
    id: Uuid,
    customer_name: String,
    plate_number: String,
    vehicle_type: String,
    date_occupied: String,
    is_overnight: &'static str,
    status: &'static str,
}

/// `GET /api/tickets` — every ticket, newest first.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let tickets =
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets ORDER BY date_occupied DESC")
            .fetch_all(&state.pool)
            .await?;

    let offset = state.display_offset();
    let rows: Vec<TicketRow> = tickets
        .into_iter()
        .map(|t| TicketRow {
            date_occupied: format_display(t.date_occupied, offset),
            is_overnight: t.parking_mode(),
            status: t.status.as_str(),
            id: t.id,
            customer_name: t.customer_name,
            plate_number: t.plate_number,
            vehicle_type: t.vehicle_type,
        })
        .collect();

    Ok(success(rows, "Tickets fetched.").into_response())
}

#[derive(Serialize)]
struct TrendPoint {
    date: String,
    revenue: Decimal,
}

/// `GET /api/tickets/get_trend` — per-day revenue over the past 7 local
/// days, today included. Days without payments report zero.
pub async fn get_trend(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let offset = state.display_offset();
    let now = Utc::now();
    let window_start = local_day_start(now, offset, 6);

    let payments: Vec<(DateTime<Utc>, Decimal)> =
        sqlx::query_as("SELECT date_occurred, price FROM payments WHERE date_occurred >= $1")
            .bind(window_start)
            .fetch_all(&state.pool)
            .await?;

    let mut trend: Vec<TrendPoint> = (0..7)
        .rev()
        .map(|days_back| TrendPoint {
            date: local_date(local_day_start(now, offset, days_back), offset)
                .format("%Y-%m-%d")
                .to_string(),
            revenue: Decimal::ZERO,
        })
        .collect();

    for (occurred, price) in payments {
        let day = local_date(occurred, offset).format("%Y-%m-%d").to_string();
        if let Some(point) = trend.iter_mut().find(|p| p.date == day) {
            point.revenue += price;
        }
    }

    Ok(success(trend, "Trend fetched.").into_response())
}

#[derive(Deserialize)]
pub struct TicketQuery {
    pub ticket_id: Uuid,
}

#[derive(Serialize)]
struct TicketDetails {
    id: Uuid,
    customer_name: String,
    plate_number: String,
    vehicle_type: String,
    date_occupied: String,
    is_overnight: &'static str,
    status: &'static str,
    section: String,
    slot_name: String,
    price_calculation: String,
    violation_count: String,
    total_price: Decimal,
}

/// Loads a ticket and prices it as of `now`: hourly or overnight fee plus
/// the surcharge for its recorded violations.
pub(crate) async fn load_quote(
    pool: &PgPool,
    ticket_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(Ticket, Quote), AppError> {
    let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(ticket_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No ticket found.".to_string()))?;

    let violations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM violations WHERE ticket_id = $1")
        .bind(ticket_id)
        .fetch_one(pool)
        .await?;

    let quote = pricing::quote(ticket.date_occupied, now, ticket.is_overnight, violations);
    Ok((ticket, quote))
}

/// `GET /api/tickets/get_ticket?ticket_id=…` — the priced receipt view.
pub async fn get_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TicketQuery>,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let (ticket, quote) = load_quote(&state.pool, query.ticket_id, Utc::now()).await?;

    let (section, slot_name): (String, String) =
        sqlx::query_as("SELECT section, name FROM slots WHERE id = $1")
            .bind(ticket.slot_occupied)
            .fetch_one(&state.pool)
            .await?;

    let details = TicketDetails {
        date_occupied: format_display(ticket.date_occupied, state.display_offset()),
        is_overnight: ticket.parking_mode(),
        status: ticket.status.as_str(),
        id: ticket.id,
        customer_name: ticket.customer_name,
        plate_number: ticket.plate_number,
        vehicle_type: ticket.vehicle_type,
        section,
        slot_name,
        price_calculation: quote.price_calculation,
        violation_count: quote.violation_line,
        total_price: quote.total,
    };

    Ok(success(details, "Ticket fetched.").into_response())
}

#[derive(Deserialize)]
pub struct CancelPayload {
    pub id: Uuid,
}

/// `PATCH /api/tickets/cancel` — voids an `Unpaid` ticket and frees its
/// slot in one transaction.
pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CancelPayload>,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;

    let mut tx = state.pool.begin().await?;

    let result = sqlx::query("UPDATE tickets SET status = $1 WHERE id = $2 AND status = $3")
        .bind(TicketStatus::Canceled)
        .bind(payload.id)
        .bind(TicketStatus::Unpaid)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No unpaid ticket found.".to_string()));
    }

    sqlx::query("UPDATE slots SET ticket_occupation = NULL WHERE ticket_occupation = $1")
        .bind(payload.id)
        .execute(&mut *tx)
        .await?;

    ParkActivity::record(
        &mut *tx,
        payload.id,
        "Parking Canceled and is now Vacant.",
        ActivityLevel::Danger,
        user.id,
    )
    .await?;

    tx.commit().await?;

    Ok(empty_success("Ticket was canceled.").into_response())
}

#[derive(Deserialize)]
pub struct UpdateTicketPayload {
    pub ticket: Uuid,
    pub section: String,
    pub slot: String,
    pub customer_name: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub is_overnight: bool,
}

/// `PATCH /api/tickets/update` — edits ticket fields and, when the target
/// slot differs from the current one, moves the occupation pointer and
/// records the move.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTicketPayload>,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;

    let section = payload.section.trim();
    let slot_name = payload.slot.trim();
    let customer_name = payload.customer_name.trim();
    let plate_number = payload.plate_number.trim();
    let vehicle_type = payload.vehicle_type.trim();
    if section.is_empty()
        || slot_name.is_empty()
        || customer_name.is_empty()
        || plate_number.is_empty()
        || vehicle_type.is_empty()
    {
        return Err(AppError::ValidationError("Invalid body found.".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    let target_id: Uuid =
        sqlx::query_scalar("SELECT id FROM slots WHERE section = $1 AND name = $2 FOR UPDATE")
            .bind(section)
            .bind(slot_name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("No slot found.".to_string()))?;

    let current: Option<(Uuid, String, String)> = sqlx::query_as(
        "SELECT id, section, name FROM slots WHERE ticket_occupation = $1 FOR UPDATE",
    )
    .bind(payload.ticket)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((current_id, old_section, old_name)) = current {
        if current_id != target_id {
            sqlx::query("UPDATE slots SET ticket_occupation = NULL WHERE id = $1")
                .bind(current_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE slots SET ticket_occupation = $1 WHERE id = $2")
                .bind(payload.ticket)
                .bind(target_id)
                .execute(&mut *tx)
                .await?;

            ParkActivity::record(
                &mut *tx,
                payload.ticket,
                &format!(
                    "Parking was moved from {} {} to {} {}.",
                    old_section, old_name, section, slot_name
                ),
                ActivityLevel::Info,
                user.id,
            )
            .await?;
        }
    }

    let result = sqlx::query(
        "UPDATE tickets SET customer_name = $1, plate_number = $2, vehicle_type = $3, \
         is_overnight = $4, slot_occupied = $5 WHERE id = $6",
    )
    .bind(customer_name)
    .bind(plate_number)
    .bind(vehicle_type)
    .bind(payload.is_overnight)
    .bind(target_id)
    .bind(payload.ticket)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No ticket found.".to_string()));
    }

    tx.commit().await?;

    Ok(empty_success("Updated.").into_response())
}
