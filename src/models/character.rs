use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Character ownership and class, keyed by `character_uuid`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CharacterInfo {
    pub character_uuid: Uuid,
    pub uuid: Uuid,
    pub character_type: String,
}

/// Character snapshot, keyed by its content key `unique_id`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CharacterHistory {
    pub unique_id: Uuid,
    pub character_uuid: Uuid,
    pub level: i32,
    pub xp: i64,
    pub wars: i32,
    pub playtime: f64,
    pub mobs_killed: i64,
    pub chests_found: i32,
    pub logins: i32,
    pub deaths: i32,
    pub discoveries: i32,
    pub gamemode: Vec<String>,
    // Profession levels, fractional part is progress to the next level
    pub alchemism: f64,
    pub armouring: f64,
    pub cooking: f64,
    pub jeweling: f64,
    pub scribing: f64,
    pub tailoring: f64,
    pub weaponsmithing: f64,
    pub woodworking: f64,
    pub mining: f64,
    pub woodcutting: f64,
    pub farming: f64,
    pub fishing: f64,
    pub dungeon_completions: i32,
    pub quest_completions: i32,
    pub raid_completions: i32,
    pub datetime: DateTime<Utc>,
}
