use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Poller uptime window, keyed by `start_time` and extended on every run
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UptimeRecord {
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
}
