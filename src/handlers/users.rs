use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::utils::time::format_display;

#[derive(Serialize)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    is_admin: bool,
    is_active: bool,
    last_logged_in: String,
}

/// `GET /api/users/populate` (admin) — every account on the site.
pub async fn populate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    let offset = state.display_offset();
    let rows: Vec<UserRow> = users
        .into_iter()
        .map(|u| UserRow {
            id: u.id,
            name: u.name,
            email: u.email,
            is_admin: u.is_admin,
            is_active: u.is_active,
            last_logged_in: format_display(u.last_logged_in, offset),
        })
        .collect();

    Ok(success(rows, "Users fetched.").into_response())
}

#[derive(Deserialize)]
pub struct FetchOnePayload {
    pub user_id: Uuid,
}

#[derive(Serialize)]
struct UserDetail {
    id: Uuid,
    name: String,
    email: String,
    is_admin: bool,
    is_active: bool,
}

/// `POST /api/users/fetch_one` (admin).
pub async fn fetch_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FetchOnePayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found.".to_string()))?;

    let detail = UserDetail {
        id: user.id,
        name: user.name,
        email: user.email,
        is_admin: user.is_admin,
        is_active: user.is_active,
    };
    Ok(success(detail, "User fetched.").into_response())
}

#[derive(Deserialize)]
pub struct AddUserPayload {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// `POST /api/users/add` (admin). New accounts start active.
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddUserPayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let name = payload.full_name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&state.pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::ValidationError(
            "Email address already exists.".to_string(),
        ));
    }

    let salt = auth::generate_salt();
    let hash = auth::hash_password(&payload.password, &salt);
    sqlx::query(
        "INSERT INTO users (id, name, email, salt, password_hash, is_admin, is_active, last_logged_in) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(&salt)
    .bind(&hash)
    .bind(payload.is_admin)
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    Ok(empty_success("User added.").into_response())
}

#[derive(Deserialize)]
pub struct UpdateUserPayload {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// `PATCH /api/users/update` (admin). The email must not already belong to
/// a different account.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let name = payload.full_name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&state.pool)
        .await?;
    if let Some((owner_id,)) = owner {
        if owner_id != payload.id {
            return Err(AppError::ValidationError(
                "Email address already exists.".to_string(),
            ));
        }
    }

    let result = sqlx::query("UPDATE users SET name = $1, email = $2, is_admin = $3 WHERE id = $4")
        .bind(name)
        .bind(email)
        .bind(payload.is_admin)
        .bind(payload.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No user found.".to_string()));
    }

    Ok(empty_success("User edited.").into_response())
}

#[derive(Deserialize)]
pub struct ActivatePayload {
    pub id: Uuid,
}

/// `PATCH /api/users/activate` (admin) — toggles `is_active`. Deactivation
/// purges the target's sessions so live logins die immediately.
pub async fn activate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ActivatePayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    let is_active: bool = sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
        .bind(payload.id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found.".to_string()))?;

    let now_active = !is_active;
    sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
        .bind(now_active)
        .bind(payload.id)
        .execute(&state.pool)
        .await?;

    if !now_active {
        auth::purge_sessions(&state.pool, payload.id).await?;
    }

    Ok(empty_success("User active changed.").into_response())
}

#[derive(Deserialize)]
pub struct ResetPasswordPayload {
    pub user_id: Uuid,
    pub new_password: String,
}

/// `PATCH /api/users/changepassword` (admin) — resets a user's password
/// without the old one and purges their sessions.
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Response, AppError> {
    auth::require_admin(&state.pool, &headers).await?;

    if payload.new_password.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("No user found.".to_string()));
    }

    auth::set_password(&state.pool, payload.user_id, &payload.new_password).await?;
    auth::purge_sessions(&state.pool, payload.user_id).await?;

    Ok(empty_success("Password reset.").into_response())
}
