use axum::http::header::{HeaderMap, HeaderValue, COOKIE};
use chrono::Duration;

use crate::utils::error::AppError;

/// Name of the session cookie presented on every authenticated request.
pub const SESSION_COOKIE: &str = "session_data";

/// Pulls the session token out of the request's `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers.get_all(COOKIE).iter().find_map(|value| {
        let raw = value.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
    })
}

/// `Set-Cookie` value for a fresh session. `remember_for` turns the
/// browser-session cookie into a persistent one ("remember me").
pub fn session_cookie(token: &str, remember_for: Option<Duration>) -> Result<HeaderValue, AppError> {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE, token);
    if let Some(ttl) = remember_for {
        cookie.push_str(&format!("; Max-Age={}", ttl.num_seconds()));
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalServerError(format!("Invalid cookie header: {}", e)))
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session_data=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(raw: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static(raw));
        headers
    }

    #[test]
    fn reads_the_session_token() {
        let headers = headers_with_cookie("session_data=abc123");
        assert_eq!(session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn finds_the_token_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; session_data=tok; lang=en");
        assert_eq!(session_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let headers = headers_with_cookie("session_data=");
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let value = session_cookie("tok", None).unwrap();
        let raw = value.to_str().unwrap();
        assert!(raw.starts_with("session_data=tok"));
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("SameSite=Strict"));
        assert!(!raw.contains("Max-Age"));
    }

    #[test]
    fn remember_me_sets_max_age() {
        let value = session_cookie("tok", Some(Duration::days(30))).unwrap();
        let raw = value.to_str().unwrap();
        assert!(raw.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let raw = clear_session_cookie();
        assert!(raw.to_str().unwrap().contains("Max-Age=0"));
    }
}
