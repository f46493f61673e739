use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth;
use crate::models::User;
use crate::state::AppState;
use crate::utils::cookies::{clear_session_cookie, session_cookie, session_token};
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// `POST /api/auth/login`. On success sets the session cookie and returns
/// the profile. All credential failures are 401 so callers can't probe.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| {
            AppError::AuthError("No account found for this email address.".to_string())
        })?;

    if !user.is_active {
        return Err(AppError::AuthError(
            "This account is currently deactivated.".to_string(),
        ));
    }

    if auth::hash_password(&payload.password, &user.salt) != user.password_hash {
        return Err(AppError::AuthError(
            "Invalid email or password.".to_string(),
        ));
    }

    sqlx::query("UPDATE users SET last_logged_in = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    let ttl = state.session_ttl();
    let token = auth::issue_session(&state.pool, user.id, ttl).await?;
    let cookie = session_cookie(&token, payload.remember_me.then_some(ttl))?;

    let profile = auth::CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        is_admin: user.is_admin,
    };

    let mut response = success(profile, "Logged in.").into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// `GET /api/auth/session` — the profile behind the presented cookie.
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user = auth::require_session(&state.pool, &headers).await?;
    Ok(success(user, "Session is valid.").into_response())
}

#[derive(Deserialize)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    pub new_password: String,
}

/// `PATCH /api/auth/changepassword`. Purges every session of the user and
/// clears the cookie, forcing a fresh login.
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Response, AppError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::ValidationError("Cannot be empty.".to_string()));
    }

    let user = auth::require_session(&state.pool, &headers).await?;
    auth::change_password(
        &state.pool,
        user.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    let mut response = empty_success("Password changed.").into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    Ok(response)
}

/// `DELETE /api/auth/logout`. Always succeeds; deletes the session row if
/// one was presented and clears the cookie either way.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        auth::delete_session(&state.pool, &token).await?;
    }

    let mut response = empty_success("Logout successful").into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_defaults_remember_me_off() {
        let payload: LoginPayload =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
        assert!(!payload.remember_me);

        let payload: LoginPayload =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw","remember_me":true}"#)
                .unwrap();
        assert!(payload.remember_me);
    }
}
