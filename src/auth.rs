use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::cookies::session_token;
use crate::utils::error::AppError;

/// Profile of the account behind a valid session, attached to every
/// authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Fresh random salt, 32 hex chars.
pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Lowercase hex SHA-256 of `salt + password`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Opaque session token, 64 hex chars. Stored server-side only; carries no
/// information about the user.
pub fn new_session_token() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Inserts a session row for `user_id` and returns its token.
pub async fn issue_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, AppError> {
    let token = new_session_token();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(&token)
    .bind(user_id)
    .bind(now)
    .bind(now + ttl)
    .execute(pool)
    .await?;
    Ok(token)
}

#[derive(FromRow)]
struct SessionUserRow {
    id: Uuid,
    name: String,
    email: String,
    is_admin: bool,
    expires_at: DateTime<Utc>,
}

/// Resolves a token to its user. Unknown and expired tokens fail the same
/// way so the client cannot tell them apart.
pub async fn verify_session(pool: &PgPool, token: &str) -> Result<CurrentUser, AppError> {
    let row = sqlx::query_as::<_, SessionUserRow>(
        "SELECT u.id, u.name, u.email, u.is_admin, s.expires_at \
         FROM sessions s \
         INNER JOIN users u ON u.id = s.user_id \
         WHERE s.token = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::AuthError("Invalid or expired session.".to_string()))?;

    if row.expires_at < Utc::now() {
        return Err(AppError::AuthError("Session expired.".to_string()));
    }

    Ok(CurrentUser {
        id: row.id,
        name: row.name,
        email: row.email,
        is_admin: row.is_admin,
    })
}

/// Reads the session cookie from the request and validates it.
pub async fn require_session(pool: &PgPool, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let token = session_token(headers)
        .ok_or_else(|| AppError::AuthError("Invalid or expired session.".to_string()))?;
    verify_session(pool, &token).await
}

/// `require_session` plus the admin flag.
pub async fn require_admin(pool: &PgPool, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let user = require_session(pool, headers).await?;
    if !user.is_admin {
        return Err(AppError::Forbidden(
            "You cannot access this method.".to_string(),
        ));
    }
    Ok(user)
}

/// Self-service password change: the old password must verify against the
/// stored salt and hash. Every session of the user is purged afterwards.
pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT salt, password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let (salt, stored_hash) =
        row.ok_or_else(|| AppError::NotFound("No user found.".to_string()))?;

    if hash_password(old_password, &salt) != stored_hash {
        return Err(AppError::AuthError(
            "Old password is incorrect.".to_string(),
        ));
    }

    set_password(pool, user_id, new_password).await?;
    purge_sessions(pool, user_id).await
}

/// Re-salts and overwrites a user's password, then purges their sessions.
/// The admin reset path; does not check the old password.
pub async fn set_password(
    pool: &PgPool,
    user_id: Uuid,
    new_password: &str,
) -> Result<(), AppError> {
    let salt = generate_salt();
    let hash = hash_password(new_password, &salt);
    sqlx::query("UPDATE users SET salt = $1, password_hash = $2 WHERE id = $3")
        .bind(&salt)
        .bind(&hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes the single session behind `token`. Missing rows are fine.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Kills every live login of a user. Called on password change and on
/// deactivation.
pub async fn purge_sessions(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// First-run bootstrap: when the users table is empty, creates an active
/// admin from `ADMIN_EMAIL`/`ADMIN_PASSWORD`. Without it a fresh deployment
/// has no account that could create accounts.
pub async fn bootstrap_admin(
    pool: &PgPool,
    admin_email: Option<&str>,
    admin_password: Option<&str>,
) -> Result<(), AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let (email, password) = match (admin_email, admin_password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            tracing::warn!(
                "No users exist and ADMIN_EMAIL/ADMIN_PASSWORD are not set; nobody can log in"
            );
            return Ok(());
        }
    };

    let salt = generate_salt();
    let hash = hash_password(password, &salt);
    sqlx::query(
        "INSERT INTO users (id, name, email, salt, password_hash, is_admin, is_active, last_logged_in) \
         VALUES ($1, $2, $3, $4, $5, TRUE, TRUE, $6)",
    )
    .bind(Uuid::new_v4())
    .bind("Administrator")
    .bind(email)
    .bind(&salt)
    .bind(&hash)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    tracing::info!(email, "Bootstrapped initial admin account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salts_are_random_and_32_hex_chars() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hashing_is_deterministic_per_salt() {
        let salt = "0123456789abcdef0123456789abcdef";
        assert_eq!(
            hash_password("hunter2", salt),
            hash_password("hunter2", salt)
        );
        assert_ne!(
            hash_password("hunter2", salt),
            hash_password("hunter2", "another-salt")
        );
        assert_ne!(
            hash_password("hunter2", salt),
            hash_password("hunter3", salt)
        );
    }

    #[test]
    fn hash_is_sha256_of_salt_then_password() {
        // SHA-256("abc") with salt "ab" and password "c".
        assert_eq!(
            hash_password("c", "ab"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn session_tokens_are_opaque_64_hex_chars() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
