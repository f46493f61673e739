use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth;
use crate::handlers::tickets::load_quote;
use crate::models::{ActivityLevel, ParkActivity, TicketStatus};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::utils::time::{format_display, local_day_range};

#[derive(FromRow)]
struct PaymentJoinRow {
    id: Uuid,
    ticket_id: Uuid,
    price: Decimal,
    method: String,
    reference_id: String,
    date_occurred: DateTime<Utc>,
    customer_name: String,
}

#[derive(Serialize)]
struct PaymentRow {
    id: Uuid,
    ticket_id: Uuid,
    price: Decimal,
    method: String,
    reference_id: String,
    customer_name: String,
    date_occurred: String,
}

impl PaymentRow {
    fn from_join(row: PaymentJoinRow, offset: chrono::FixedOffset) -> Self {
        Self {
            date_occurred: format_display(row.date_occurred, offset),
            id: row.id,
            ticket_id: row.ticket_id,
            price: row.price,
            method: row.method,
            reference_id: row.reference_id,
            customer_name: row.customer_name,
        }
    }
}

const PAYMENT_JOIN: &str = "SELECT p.id, p.ticket_id, p.price, p.method, p.reference_id, \
     p.date_occurred, t.customer_name \
     FROM payments p INNER JOIN tickets t ON t.id = p.ticket_id";

/// `GET /api/payment` — every payment with the payer's name, newest first.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let rows = sqlx::query_as::<_, PaymentJoinRow>(&format!(
        "{} ORDER BY p.date_occurred DESC",
        PAYMENT_JOIN
    ))
    .fetch_all(&state.pool)
    .await?;

    let offset = state.display_offset();
    let payments: Vec<PaymentRow> = rows
        .into_iter()
        .map(|row| PaymentRow::from_join(row, offset))
        .collect();

    Ok(success(payments, "Payments fetched.").into_response())
}

#[derive(Deserialize)]
pub struct TicketQuery {
    pub ticket_id: Uuid,
}

/// `GET /api/payment/fetch_payment?ticket_id=…`.
pub async fn fetch_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TicketQuery>,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let row = sqlx::query_as::<_, PaymentJoinRow>(&format!(
        "{} WHERE p.ticket_id = $1",
        PAYMENT_JOIN
    ))
    .bind(query.ticket_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No payment found.".to_string()))?;

    let payment = PaymentRow::from_join(row, state.display_offset());
    Ok(success(payment, "Payment fetched.").into_response())
}

#[derive(Serialize)]
struct RevenueTrend {
    daily_revenue: Decimal,
    percentage: Decimal,
}

/// Percentage change of today's revenue against yesterday's, rounded to
/// two decimals. Both-zero is flat; a zero yesterday caps at ±100.
fn percentage_difference(today: Decimal, yesterday: Decimal) -> Decimal {
    let pct = if yesterday.is_zero() {
        if today.is_zero() {
            Decimal::ZERO
        } else if today > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            -Decimal::ONE_HUNDRED
        }
    } else {
        (today - yesterday) / yesterday * Decimal::ONE_HUNDRED
    };
    pct.round_dp(2)
}

/// `GET /api/payment/trends` — today's revenue vs yesterday's, in the
/// site's local days.
pub async fn trends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_session(&state.pool, &headers).await?;

    let offset = state.display_offset();
    let now = Utc::now();

    let mut revenue = [Decimal::ZERO, Decimal::ZERO];
    for (days_back, slot) in revenue.iter_mut().enumerate() {
        let (start, end) = local_day_range(now, offset, days_back as i64);
        *slot = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price), 0) FROM payments \
             WHERE date_occurred >= $1 AND date_occurred < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&state.pool)
        .await?;
    }

    let trend = RevenueTrend {
        daily_revenue: revenue[0],
        percentage: percentage_difference(revenue[0], revenue[1]),
    };
    Ok(success(trend, "Trend fetched.").into_response())
}

#[derive(Deserialize)]
pub struct PayPayload {
    pub ticket: Uuid,
    pub price: Decimal,
    pub method: String,
    pub reference_id: String,
}

/// `POST /api/payment/pay` — settles an unpaid ticket. The recorded price
/// is the computed due amount, not the tendered cash; ticket status,
/// payment row, slot pointer, and the audit entry commit together.
pub async fn pay(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PayPayload>,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;

    let method = payload.method.trim();
    let reference_id = payload.reference_id.trim();
    if method.is_empty() || reference_id.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let already_paid: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM payments WHERE ticket_id = $1")
            .bind(payload.ticket)
            .fetch_optional(&state.pool)
            .await?;
    if already_paid.is_some() {
        return Err(AppError::ValidationError("Already paid.".to_string()));
    }

    let (ticket, quote) = load_quote(&state.pool, payload.ticket, Utc::now()).await?;
    if ticket.status != TicketStatus::Unpaid {
        return Err(AppError::ValidationError(
            "Ticket is not unpaid.".to_string(),
        ));
    }
    if payload.price < quote.total {
        return Err(AppError::ValidationError("Payment is too low.".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE tickets SET status = $1 WHERE id = $2")
        .bind(TicketStatus::Paid)
        .bind(payload.ticket)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO payments (id, ticket_id, date_occurred, price, method, reference_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(payload.ticket)
    .bind(Utc::now())
    .bind(quote.total)
    .bind(method)
    .bind(reference_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE slots SET ticket_occupation = NULL WHERE ticket_occupation = $1")
        .bind(payload.ticket)
        .execute(&mut *tx)
        .await?;

    ParkActivity::record(
        &mut *tx,
        payload.ticket,
        "Parking is now Vacant.",
        ActivityLevel::Info,
        user.id,
    )
    .await?;

    tx.commit().await?;

    Ok(empty_success("Paid.").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn both_zero_days_are_flat() {
        assert_eq!(percentage_difference(dec(0), dec(0)), dec(0));
    }

    #[test]
    fn zero_yesterday_caps_at_one_hundred() {
        assert_eq!(percentage_difference(dec(500), dec(0)), dec(100));
    }

    #[test]
    fn normal_change_is_rounded_to_two_decimals() {
        assert_eq!(percentage_difference(dec(150), dec(100)), dec(50));
        assert_eq!(
            percentage_difference(dec(100), dec(300)),
            Decimal::new(-6667, 2)
        );
    }
}
