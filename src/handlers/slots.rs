use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::models::{ActivityLevel, ParkActivity, Slot, TicketStatus};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::utils::time::format_display;

/// `GET /api/slots/populate_sections`.
pub async fn populate_sections(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let sections: Vec<String> =
        sqlx::query_scalar("SELECT name FROM slot_sections ORDER BY name")
            .fetch_all(&state.pool)
            .await?;

    Ok(success(sections, "Sections fetched.").into_response())
}

#[derive(Deserialize)]
pub struct SectionQuery {
    pub section: String,
}

/// `GET /api/slots/populate_slots?section=…` — slots of a section in
/// position order.
pub async fn populate_slots(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SectionQuery>,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    if query.section.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Invalid section given.".to_string(),
        ));
    }

    let slots =
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE section = $1 ORDER BY position")
            .bind(query.section.trim())
            .fetch_all(&state.pool)
            .await?;

    Ok(success(slots, "Slots fetched.").into_response())
}

#[derive(Deserialize)]
pub struct SlotQuery {
    pub slot_id: Uuid,
}

#[derive(Serialize)]
struct SlotDetail {
    id: Uuid,
    name: String,
    section: String,
    ticket_occupation: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vehicle_type: Option<String>,
}

/// `GET /api/slots/get_slot?slot_id=…` — slot details, plus the occupying
/// ticket's vehicle when the slot is taken.
pub async fn get_slot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SlotQuery>,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
        .bind(query.slot_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No slot found.".to_string()))?;

    let mut detail = SlotDetail {
        id: slot.id,
        name: slot.name,
        section: slot.section,
        ticket_occupation: slot.ticket_occupation,
        customer_name: None,
        plate_number: None,
        vehicle_type: None,
    };

    if let Some(ticket_id) = slot.ticket_occupation {
        let vehicle: (String, String, String) = sqlx::query_as(
            "SELECT customer_name, plate_number, vehicle_type FROM tickets WHERE id = $1",
        )
        .bind(ticket_id)
        .fetch_one(&state.pool)
        .await?;
        detail.customer_name = Some(vehicle.0);
        detail.plate_number = Some(vehicle.1);
        detail.vehicle_type = Some(vehicle.2);
    }

    Ok(success(detail, "Slot fetched.").into_response())
}

#[derive(Deserialize)]
pub struct AddSectionPayload {
    pub name: String,
}

/// `POST /api/slots/add_section` (admin).
pub async fn add_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddSectionPayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError(
            "Invalid section given.".to_string(),
        ));
    }

    let exists: Option<(String,)> =
        sqlx::query_as("SELECT name FROM slot_sections WHERE name = $1")
            .bind(name)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_some() {
        return Err(AppError::ValidationError(
            "Section already exists.".to_string(),
        ));
    }

    sqlx::query("INSERT INTO slot_sections (name) VALUES ($1)")
        .bind(name)
        .execute(&state.pool)
        .await?;

    Ok(empty_success("Section added.").into_response())
}

#[derive(Deserialize)]
pub struct AddSlotsPayload {
    pub section: String,
    pub count: i32,
}

/// `POST /api/slots/add` (admin) — appends `count` slots to a section,
/// numbered after the current highest position.
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddSlotsPayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let section = payload.section.trim();
    if section.is_empty() {
        return Err(AppError::ValidationError(
            "Invalid section given.".to_string(),
        ));
    }
    if payload.count < 1 {
        return Err(AppError::ValidationError(
            "Invalid number of slots found.".to_string(),
        ));
    }

    let exists: Option<(String,)> =
        sqlx::query_as("SELECT name FROM slot_sections WHERE name = $1")
            .bind(section)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("No section found.".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    let max_position: Option<i32> =
        sqlx::query_scalar("SELECT MAX(position) FROM slots WHERE section = $1")
            .bind(section)
            .fetch_one(&mut *tx)
            .await?;
    let mut position = max_position.unwrap_or(0);

    for _ in 0..payload.count {
        position += 1;
        sqlx::query(
            "INSERT INTO slots (id, name, section, position, ticket_occupation) \
             VALUES ($1, $2, $3, $4, NULL)",
        )
        .bind(Uuid::new_v4())
        .bind(format!("Slot {}", position))
        .bind(section)
        .bind(position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(empty_success("Slots added.").into_response())
}

#[derive(Deserialize)]
pub struct OccupyPayload {
    pub section: String,
    pub slot: String,
    pub customer_name: String,
    pub plate_number: String,
    pub vehicle_type: String,
    #[serde(default)]
    pub is_overnight: bool,
}

#[derive(Serialize)]
struct OccupyResult {
    ticket_id: Uuid,
    date_occupied: String,
}

/// `POST /api/slots/occupy` — opens an `Unpaid` ticket on a vacant slot.
/// Ticket insert, slot pointer, and the audit entry commit together.
pub async fn occupy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OccupyPayload>,
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

    let slot_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM slots \
         WHERE section = $1 AND name = $2 AND ticket_occupation IS NULL \
         FOR UPDATE",
    )
    .bind(section)
    .bind(slot_name)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::ValidationError("No vacant slot found.".to_string()))?;

    let ticket_id = Uuid::new_v4();
    let date_occupied = Utc::now();
    sqlx::query(
        "INSERT INTO tickets \
         (id, customer_name, plate_number, vehicle_type, date_occupied, is_overnight, status, slot_occupied) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(ticket_id)
    .bind(customer_name)
    .bind(plate_number)
    .bind(vehicle_type)
    .bind(date_occupied)
    .bind(payload.is_overnight)
    .bind(TicketStatus::Unpaid)
    .bind(slot_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE slots SET ticket_occupation = $1 WHERE id = $2")
        .bind(ticket_id)
        .bind(slot_id)
        .execute(&mut *tx)
        .await?;

    ParkActivity::record(
        &mut *tx,
        ticket_id,
        &format!("Parking {} {} Occupied.", section, slot_name),
        ActivityLevel::Info,
        user.id,
    )
    .await?;

    tx.commit().await?;

    let result = OccupyResult {
        ticket_id,
        date_occupied: format_display(date_occupied, state.display_offset()),
    };
    Ok(success(result, "Occupied.").into_response())
}
