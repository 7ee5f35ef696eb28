//! Mapping of upstream responses to persistence entities.
//!
//! Every function is pure; presence state the roster conversions need is
//! passed in by the caller.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::api::{GuildResponse, OnlinePlayersResponse, PlayerResponse};
use crate::models::{
    CharacterHistory, CharacterInfo, ContentKey, GuildHistory, GuildInfo, GuildMemberHistory,
    OnlinePlayer, PlayerActivityHistory, PlayerHistory, PlayerInfo,
};

pub fn player_info(resp: &PlayerResponse) -> PlayerInfo {
    PlayerInfo {
        uuid: resp.body.uuid,
        latest_username: resp.body.username.clone(),
        first_join: resp.body.first_join,
    }
}

pub fn player_history(resp: &PlayerResponse) -> PlayerHistory {
    let player = &resp.body;
    let guild_name = player.guild.as_ref().map(|g| g.name.clone());
    let guild_rank = player.guild.as_ref().and_then(|g| g.rank.clone());

    let unique_id = ContentKey::new("player_history")
        .push_uuid(&player.uuid)
        .push_str(&player.username)
        .push_opt_str(player.support_rank.as_deref())
        .push_f64(player.playtime)
        .push_opt_str(guild_name.as_deref())
        .push_opt_str(guild_rank.as_deref())
        .push_opt_str(player.rank.as_deref())
        .finish();

    PlayerHistory {
        unique_id,
        uuid: player.uuid,
        username: player.username.clone(),
        support_rank: player.support_rank.clone(),
        playtime: player.playtime,
        guild_name,
        guild_rank,
        rank: player.rank.clone(),
        datetime: resp.headers.observed_at,
    }
}

pub fn character_info(resp: &PlayerResponse) -> Vec<CharacterInfo> {
    resp.body
        .characters
        .iter()
        .map(|(character_uuid, character)| CharacterInfo {
            character_uuid: *character_uuid,
            uuid: resp.body.uuid,
            character_type: character.kind.clone(),
        })
        .collect()
}

pub fn character_history(resp: &PlayerResponse) -> Vec<CharacterHistory> {
    resp.body
        .characters
        .iter()
        .map(|(character_uuid, ch)| {
            let p = &ch.professions;
            let professions = [
                p.alchemism.as_decimal(),
                p.armouring.as_decimal(),
                p.cooking.as_decimal(),
                p.jeweling.as_decimal(),
                p.scribing.as_decimal(),
                p.tailoring.as_decimal(),
                p.weaponsmithing.as_decimal(),
                p.woodworking.as_decimal(),
                p.mining.as_decimal(),
                p.woodcutting.as_decimal(),
                p.farming.as_decimal(),
                p.fishing.as_decimal(),
            ];
            let dungeon_completions = ch.dungeons.map(|d| d.total).unwrap_or(0);
            let raid_completions = ch.raids.map(|r| r.total).unwrap_or(0);
            let quest_completions = i32::try_from(ch.quests.len()).unwrap_or(i32::MAX);

            let mut key = ContentKey::new("character_history");
            key.push_uuid(character_uuid)
                .push_i64(ch.level.into())
                .push_i64(ch.xp)
                .push_i64(ch.wars.into())
                .push_f64(ch.playtime)
                .push_i64(ch.mobs_killed)
                .push_i64(ch.chests_found.into())
                .push_i64(ch.logins.into())
                .push_i64(ch.deaths.into())
                .push_i64(ch.discoveries.into());
            for mode in &ch.gamemode {
                key.push_str(mode);
            }
            for level in professions {
                key.push_f64(level);
            }
            key.push_i64(dungeon_completions.into())
                .push_i64(quest_completions.into())
                .push_i64(raid_completions.into());

            let [
                alchemism,
                armouring,
                cooking,
                jeweling,
                scribing,
                tailoring,
                weaponsmithing,
                woodworking,
                mining,
                woodcutting,
                farming,
                fishing,
            ] = professions;

            CharacterHistory {
                unique_id: key.finish(),
                character_uuid: *character_uuid,
                level: ch.level,
                xp: ch.xp,
                wars: ch.wars,
                playtime: ch.playtime,
                mobs_killed: ch.mobs_killed,
                chests_found: ch.chests_found,
                logins: ch.logins,
                deaths: ch.deaths,
                discoveries: ch.discoveries,
                gamemode: ch.gamemode.clone(),
                alchemism,
                armouring,
                cooking,
                jeweling,
                scribing,
                tailoring,
                weaponsmithing,
                woodworking,
                mining,
                woodcutting,
                farming,
                fishing,
                dungeon_completions,
                quest_completions,
                raid_completions,
                datetime: resp.headers.observed_at,
            }
        })
        .collect()
}

pub fn guild_info(resp: &GuildResponse) -> GuildInfo {
    GuildInfo {
        name: resp.body.name.clone(),
        prefix: resp.body.prefix.clone(),
        created: resp.body.created,
    }
}

pub fn guild_history(resp: &GuildResponse) -> GuildHistory {
    let guild = &resp.body;
    let online_members = i32::try_from(guild.members.online_count()).unwrap_or(i32::MAX);

    let unique_id = ContentKey::new("guild_history")
        .push_str(&guild.name)
        .push_i64(guild.level.into())
        .push_i64(guild.territories.into())
        .push_i64(guild.wars.into())
        .push_i64(guild.members.total.into())
        .push_i64(online_members.into())
        .finish();

    GuildHistory {
        unique_id,
        name: guild.name.clone(),
        level: guild.level,
        territories: guild.territories,
        wars: guild.wars,
        member_total: guild.members.total,
        online_members,
        datetime: resp.headers.observed_at,
    }
}

/// One record per online member; members without a resolvable uuid are skipped
pub fn guild_member_history(resp: &GuildResponse) -> Vec<GuildMemberHistory> {
    resp.body
        .members
        .online()
        .filter_map(|(_rank, key, member)| {
            let Some(uuid) = member.resolve_uuid(key) else {
                log::debug!("Skipping guild member '{}' without uuid", key);
                return None;
            };

            let unique_id = ContentKey::new("guild_member_history")
                .push_uuid(&uuid)
                .push_i64(member.contributed)
                .push_datetime(&member.joined)
                .finish();

            Some(GuildMemberHistory {
                unique_id,
                uuid,
                contributed: member.contributed,
                joined: member.joined,
                datetime: resp.headers.observed_at,
            })
        })
        .collect()
}

/// One record per listed player whose identifier is a uuid
pub fn online_players(resp: &OnlinePlayersResponse) -> Vec<OnlinePlayer> {
    let mut seen = HashSet::new();
    resp.body
        .players
        .iter()
        .filter_map(|(id, server)| {
            Uuid::parse_str(id).ok().map(|uuid| OnlinePlayer {
                uuid,
                server: server.clone(),
            })
        })
        .filter(|player| seen.insert(player.uuid))
        .collect()
}

/// One record per player that just logged on
pub fn player_activity(
    resp: &OnlinePlayersResponse,
    logged_on: &HashSet<String>,
    logon_timestamps: &HashMap<String, DateTime<Utc>>,
) -> Vec<PlayerActivityHistory> {
    resp.body
        .player_ids()
        .filter(|id| logged_on.contains(*id))
        .filter_map(|id| {
            let uuid = Uuid::parse_str(id).ok()?;
            Some(PlayerActivityHistory {
                uuid,
                logon_datetime: logon_timestamps
                    .get(id)
                    .copied()
                    .unwrap_or(resp.headers.observed_at),
                datetime: resp.headers.observed_at,
            })
        })
        .collect()
}
