use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Slowly changing player profile, keyed by `uuid`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PlayerInfo {
    pub uuid: Uuid,
    pub latest_username: String,
    pub first_join: DateTime<Utc>,
}

/// Player snapshot, keyed by its content key `unique_id`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PlayerHistory {
    pub unique_id: Uuid,
    pub uuid: Uuid,
    pub username: String,
    pub support_rank: Option<String>,
    pub playtime: f64,
    pub guild_name: Option<String>,
    pub guild_rank: Option<String>,
    pub rank: Option<String>,
    pub datetime: DateTime<Utc>,
}
