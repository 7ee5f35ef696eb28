use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A player seen on the online roster, keyed by `uuid`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OnlinePlayer {
    pub uuid: Uuid,
    pub server: String,
}

/// Logon observed by the roster diff, keyed by (`uuid`, `logon_datetime`)
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PlayerActivityHistory {
    pub uuid: Uuid,
    pub logon_datetime: DateTime<Utc>,
    pub datetime: DateTime<Utc>,
}
