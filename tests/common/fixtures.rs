//! Test fixtures for building upstream responses

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use kans::api::model::{Character, GuildMember, GuildMembers, PlayerGuild};
use kans::api::{
    ApiResponse, Guild, GuildResponse, OnlinePlayersResponse, Player, PlayerResponse, Quota,
    ResponseHeaders, Roster,
};

/// Fixed base time every fixture is relative to
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// `t0() + secs`
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Deterministic uuid for player or character number `n`
pub fn uuid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn headers(observed_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> ResponseHeaders {
    ResponseHeaders {
        observed_at,
        expires_at,
        quota: Quota::default(),
    }
}

pub fn with_quota<T>(mut resp: ApiResponse<T>, remaining: u32, reset_secs: u64) -> ApiResponse<T> {
    resp.headers.quota = Quota {
        remaining,
        total: 180,
        reset_secs,
    };
    resp
}

// =============================================================================
// Roster
// =============================================================================

pub fn roster_response(
    ids: &[&str],
    observed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> OnlinePlayersResponse {
    let players: BTreeMap<String, String> = ids
        .iter()
        .map(|id| (id.to_string(), "WC1".to_string()))
        .collect();

    ApiResponse {
        headers: headers(observed_at, expires_at),
        body: Roster {
            total: players.len() as i32,
            players,
        },
    }
}

// =============================================================================
// Player
// =============================================================================

pub fn character(kind: &str, level: i32) -> Character {
    serde_json::from_value(json!({
        "type": kind,
        "level": level,
        "xp": 1234,
        "wars": 3,
        "playtime": 12.5,
        "mobsKilled": 999,
        "chestsFound": 42,
        "logins": 10,
        "deaths": 2,
        "discoveries": 7,
        "gamemode": ["hardcore"],
        "professions": {
            "fishing": { "level": 50, "xpPercent": 25 },
            "mining": { "level": 12 }
        },
        "dungeons": { "total": 4 },
        "raids": { "total": 1 },
        "quests": ["King's Recruit", "Enzan's Brother"]
    }))
    .expect("valid character fixture")
}

pub fn player(id: Uuid, online: bool, guild: Option<&str>) -> Player {
    Player {
        uuid: id,
        username: format!("player{}", id.as_u128()),
        online,
        server: online.then(|| "WC1".to_string()),
        rank: Some("Player".to_string()),
        support_rank: None,
        first_join: Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap(),
        playtime: 100.0,
        guild: guild.map(|name| PlayerGuild {
            name: name.to_string(),
            prefix: Some("TAG".to_string()),
            rank: Some("RECRUIT".to_string()),
        }),
        characters: BTreeMap::new(),
    }
}

pub fn player_response(
    player: Player,
    observed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> PlayerResponse {
    ApiResponse {
        headers: headers(observed_at, expires_at),
        body: player,
    }
}

// =============================================================================
// Guild
// =============================================================================

/// A guild with `total` members of which the first `online` are online
pub fn guild(name: &str, total: usize, online: usize) -> Guild {
    let members: BTreeMap<String, GuildMember> = (0..total)
        .map(|i| {
            let member = GuildMember {
                uuid: Some(uuid(1_000 + i as u128)),
                username: Some(format!("member{}", i)),
                online: i < online,
                server: (i < online).then(|| "WC2".to_string()),
                contributed: 100 * i as i64,
                joined: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            };
            (format!("member{}", i), member)
        })
        .collect();

    Guild {
        uuid: Some(uuid(9_999)),
        name: name.to_string(),
        prefix: "TAG".to_string(),
        level: 80,
        territories: 5,
        wars: 120,
        created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        members: GuildMembers {
            total: total as i32,
            ranks: BTreeMap::from([("recruit".to_string(), members)]),
        },
    }
}

pub fn guild_response(
    guild: Guild,
    observed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> GuildResponse {
    ApiResponse {
        headers: headers(observed_at, expires_at),
        body: guild,
    }
}
