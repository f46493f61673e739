use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Lifetime of an issued session row.
    pub session_ttl_days: i64,
    /// Fixed offset of the site's local zone, used for display formatting
    /// and day bucketing. The lot this was written for runs at UTC+8.
    pub display_utc_offset_hours: i32,
    /// First-run bootstrap credentials; see `auth::bootstrap_admin`.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/parklot".to_string()),
            port: parse_or("PORT", 3001),
            session_ttl_days: parse_or("SESSION_TTL_DAYS", 30),
            display_utc_offset_hours: parse_or("DISPLAY_UTC_OFFSET_HOURS", 8),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_unset() {
        env::remove_var("PORT");
        env::remove_var("SESSION_TTL_DAYS");
        env::remove_var("DISPLAY_UTC_OFFSET_HOURS");
        let config = Config::from_env();
        assert_eq!(config.port, 3001);
        assert_eq!(config.session_ttl_days, 30);
        assert_eq!(config.display_utc_offset_hours, 8);
    }

    #[test]
    fn unparseable_values_fall_back_to_the_default() {
        env::set_var("SESSION_TTL_DAYS", "a month");
        let config = Config::from_env();
        assert_eq!(config.session_ttl_days, 30);
        env::remove_var("SESSION_TTL_DAYS");
    }
}
