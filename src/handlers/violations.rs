use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth;
use crate::models::{ActivityLevel, ParkActivity, Violation};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::utils::time::format_display;

#[derive(FromRow)]
struct ViolationJoinRow {
    id: Uuid,
    ticket_id: Uuid,
    date_occurred: DateTime<Utc>,
    reason: String,
    user_id: Uuid,
    customer_name: String,
}

#[derive(Serialize)]
struct ViolationRow {
    id: Uuid,
    ticket_id: Uuid,
    date_occurred: String,
    reason: String,
    user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_name: Option<String>,
}

/// `GET /api/violations` — every violation with the customer's name,
/// newest first.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let rows = sqlx::query_as::<_, ViolationJoinRow>(
        "SELECT v.id, v.ticket_id, v.date_occurred, v.reason, v.user_id, t.customer_name \
         FROM violations v INNER JOIN tickets t ON t.id = v.ticket_id \
         ORDER BY v.date_occurred DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let offset = state.display_offset();
    let violations: Vec<ViolationRow> = rows
        .into_iter()
        .map(|row| ViolationRow {
            date_occurred: format_display(row.date_occurred, offset),
            id: row.id,
            ticket_id: row.ticket_id,
            reason: row.reason,
            user_id: row.user_id,
            customer_name: Some(row.customer_name),
        })
        .collect();

    Ok(success(violations, "Violations fetched.").into_response())
}

#[derive(Deserialize)]
pub struct TicketQuery {
    pub ticket_id: Uuid,
}

/// `GET /api/violations/fetch?ticket_id=…` — one ticket's violations.
pub async fn fetch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TicketQuery>,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let rows = sqlx::query_as::<_, Violation>(
        "SELECT * FROM violations WHERE ticket_id = $1 ORDER BY date_occurred DESC",
    )
    .bind(query.ticket_id)
    .fetch_all(&state.pool)
    .await?;

    let offset = state.display_offset();
    let violations: Vec<ViolationRow> = rows
        .into_iter()
        .map(|v| ViolationRow {
            date_occurred: format_display(v.date_occurred, offset),
            id: v.id,
            ticket_id: v.ticket_id,
            reason: v.reason,
            user_id: v.user_id,
            customer_name: None,
        })
        .collect();

    Ok(success(violations, "Violations fetched.").into_response())
}

#[derive(Deserialize)]
pub struct AddViolationPayload {
    pub ticket: Uuid,
    pub reason: String,
}

/// `POST /api/violations/add` — records an infraction against a ticket and
/// flags it on the audit trail.
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddViolationPayload>,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError(
            "Invalid parameter found.".to_string(),
        ));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tickets WHERE id = $1")
        .bind(payload.ticket)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("No ticket found.".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO violations (id, ticket_id, date_occurred, reason, user_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(payload.ticket)
    .bind(Utc::now())
    .bind(reason)
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    ParkActivity::record(
        &mut *tx,
        payload.ticket,
        "Violation Occurred",
        ActivityLevel::Danger,
        user.id,
    )
    .await?;

    tx.commit().await?;

    Ok(empty_success("Violation added.").into_response())
}

#[derive(Deserialize)]
pub struct RemoveQuery {
    pub id: Uuid,
}

/// `DELETE /api/violations/remove_violation?id=…` — lifts a violation.
pub async fn remove_violation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RemoveQuery>,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;

    let mut tx = state.pool.begin().await?;

    let ticket_id: Uuid =
        sqlx::query_scalar("DELETE FROM violations WHERE id = $1 RETURNING ticket_id")
            .bind(query.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("No violation found.".to_string()))?;

    ParkActivity::record(
        &mut *tx,
        ticket_id,
        "Violation Lifted",
        ActivityLevel::Info,
        user.id,
    )
    .await?;

    tx.commit().await?;

    Ok(empty_success("Violation lifted.").into_response())
}
