use std::sync::Arc;

use chrono::{Duration, FixedOffset};
use sqlx::PgPool;

use crate::config::Config;
use crate::utils::time::offset_from_hours;

/// Shared application state handed to every handler via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    /// The site's fixed display offset. An out-of-range configured value
    /// falls back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        offset_from_hours(self.config.display_utc_offset_hours)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.config.session_ttl_days)
    }
}
