//! Typed payloads of the upstream v3 stats API.
//!
//! Only the fields the poller converts or reacts to are modelled; everything
//! else in the JSON is ignored by serde.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Body of the online roster endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub total: i32,
    /// Player identifier -> server the player is on
    #[serde(default)]
    pub players: BTreeMap<String, String>,
}

impl Roster {
    /// Iterates over the online player identifiers
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }
}

/// Body of the player endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub uuid: Uuid,
    pub username: String,
    #[serde(default)]
    pub online: bool,
    pub server: Option<String>,
    pub rank: Option<String>,
    pub support_rank: Option<String>,
    pub first_join: DateTime<Utc>,
    #[serde(default)]
    pub playtime: f64,
    pub guild: Option<PlayerGuild>,
    #[serde(default)]
    pub characters: BTreeMap<Uuid, Character>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerGuild {
    pub name: String,
    pub prefix: Option<String>,
    pub rank: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub wars: i32,
    #[serde(default)]
    pub playtime: f64,
    #[serde(default)]
    pub mobs_killed: i64,
    #[serde(default)]
    pub chests_found: i32,
    #[serde(default)]
    pub logins: i32,
    #[serde(default)]
    pub deaths: i32,
    #[serde(default)]
    pub discoveries: i32,
    #[serde(default)]
    pub gamemode: Vec<String>,
    #[serde(default)]
    pub professions: Professions,
    pub dungeons: Option<Completions>,
    pub raids: Option<Completions>,
    #[serde(default)]
    pub quests: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Professions {
    pub alchemism: Profession,
    pub armouring: Profession,
    pub cooking: Profession,
    pub jeweling: Profession,
    pub scribing: Profession,
    pub tailoring: Profession,
    pub weaponsmithing: Profession,
    pub woodworking: Profession,
    pub mining: Profession,
    pub woodcutting: Profession,
    pub farming: Profession,
    pub fishing: Profession,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profession {
    pub level: i32,
    pub xp_percent: i32,
}

impl Profession {
    /// Level with the progress towards the next level as the fractional part
    pub fn as_decimal(&self) -> f64 {
        f64::from(self.level) + f64::from(self.xp_percent) / 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Completions {
    #[serde(default)]
    pub total: i32,
}

/// Body of the guild endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guild {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub territories: i32,
    #[serde(default)]
    pub wars: i32,
    pub created: DateTime<Utc>,
    pub members: GuildMembers,
}

/// Guild roster grouped by rank
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildMembers {
    #[serde(default)]
    pub total: i32,
    /// Rank name -> (username or uuid -> member)
    #[serde(flatten)]
    pub ranks: BTreeMap<String, BTreeMap<String, GuildMember>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    pub uuid: Option<Uuid>,
    pub username: Option<String>,
    #[serde(default)]
    pub online: bool,
    pub server: Option<String>,
    #[serde(default)]
    pub contributed: i64,
    pub joined: DateTime<Utc>,
}

impl GuildMembers {
    /// Members currently online, as (rank, key, member)
    pub fn online(&self) -> impl Iterator<Item = (&str, &str, &GuildMember)> {
        self.ranks.iter().flat_map(|(rank, members)| {
            members
                .iter()
                .filter(|(_, member)| member.online)
                .map(move |(key, member)| (rank.as_str(), key.as_str(), member))
        })
    }

    pub fn online_count(&self) -> usize {
        self.online().count()
    }
}

impl GuildMember {
    /// Resolves the member's uuid from the roster key or the member body
    pub fn resolve_uuid(&self, key: &str) -> Option<Uuid> {
        Uuid::parse_str(key).ok().or(self.uuid)
    }
}
