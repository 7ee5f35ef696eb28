use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Guild identity, keyed by `name`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GuildInfo {
    pub name: String,
    pub prefix: String,
    pub created: DateTime<Utc>,
}

/// Guild snapshot, keyed by its content key `unique_id`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GuildHistory {
    pub unique_id: Uuid,
    pub name: String,
    pub level: i32,
    pub territories: i32,
    pub wars: i32,
    pub member_total: i32,
    pub online_members: i32,
    pub datetime: DateTime<Utc>,
}

/// Snapshot of one online guild member, keyed by its content key `unique_id`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GuildMemberHistory {
    pub unique_id: Uuid,
    pub uuid: Uuid,
    pub contributed: i64,
    pub joined: DateTime<Utc>,
    pub datetime: DateTime<Utc>,
}
