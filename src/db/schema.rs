//! Table definitions of every persisted entity.

use chrono::{DateTime, Utc};
use sqlx::query_builder::Separated;
use sqlx::{Encode, Postgres, QueryBuilder, Type};
use uuid::Uuid;

use super::repository::Entity;
use crate::models::{
    CharacterHistory, CharacterInfo, GuildHistory, GuildInfo, GuildMemberHistory, OnlinePlayer,
    PlayerActivityHistory, PlayerHistory, PlayerInfo, UptimeRecord,
};

fn push_eq<'args, V>(qb: &mut QueryBuilder<'args, Postgres>, column: &str, value: V)
where
    V: 'args + Encode<'args, Postgres> + Type<Postgres>,
{
    qb.push(column).push(" = ").push_bind(value);
}

impl Entity for PlayerInfo {
    type Id = Uuid;

    const TABLE: &'static str = "player_info";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS player_info (
            uuid            UUID PRIMARY KEY,
            latest_username VARCHAR(16) NOT NULL,
            first_join      TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["uuid", "latest_username", "first_join"];
    const KEY: &'static [&'static str] = &["uuid"];
    const ON_CONFLICT: &'static str =
        "ON CONFLICT (uuid) DO UPDATE SET latest_username = EXCLUDED.latest_username";

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.uuid)
            .push_bind(self.latest_username.clone())
            .push_bind(self.first_join);
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "uuid", *id);
    }
}

impl Entity for PlayerHistory {
    type Id = Uuid;

    const TABLE: &'static str = "player_history";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS player_history (
            unique_id    UUID PRIMARY KEY,
            uuid         UUID NOT NULL,
            username     VARCHAR(16) NOT NULL,
            support_rank VARCHAR(32),
            playtime     DOUBLE PRECISION NOT NULL,
            guild_name   VARCHAR(64),
            guild_rank   VARCHAR(32),
            rank         VARCHAR(32),
            datetime     TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &[
        "unique_id",
        "uuid",
        "username",
        "support_rank",
        "playtime",
        "guild_name",
        "guild_rank",
        "rank",
        "datetime",
    ];
    const KEY: &'static [&'static str] = &["unique_id"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.unique_id)
            .push_bind(self.uuid)
            .push_bind(self.username.clone())
            .push_bind(self.support_rank.clone())
            .push_bind(self.playtime)
            .push_bind(self.guild_name.clone())
            .push_bind(self.guild_rank.clone())
            .push_bind(self.rank.clone())
            .push_bind(self.datetime);
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "unique_id", *id);
    }
}

impl Entity for CharacterInfo {
    type Id = Uuid;

    const TABLE: &'static str = "character_info";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS character_info (
            character_uuid UUID PRIMARY KEY,
            uuid           UUID NOT NULL,
            character_type VARCHAR(32) NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["character_uuid", "uuid", "character_type"];
    const KEY: &'static [&'static str] = &["character_uuid"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.character_uuid)
            .push_bind(self.uuid)
            .push_bind(self.character_type.clone());
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "character_uuid", *id);
    }
}

impl Entity for CharacterHistory {
    type Id = Uuid;

    const TABLE: &'static str = "character_history";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS character_history (
            unique_id           UUID PRIMARY KEY,
            character_uuid      UUID NOT NULL,
            level               INTEGER NOT NULL,
            xp                  BIGINT NOT NULL,
            wars                INTEGER NOT NULL,
            playtime            DOUBLE PRECISION NOT NULL,
            mobs_killed         BIGINT NOT NULL,
            chests_found        INTEGER NOT NULL,
            logins              INTEGER NOT NULL,
            deaths              INTEGER NOT NULL,
            discoveries         INTEGER NOT NULL,
            gamemode            TEXT[] NOT NULL,
            alchemism           DOUBLE PRECISION NOT NULL,
            armouring           DOUBLE PRECISION NOT NULL,
            cooking             DOUBLE PRECISION NOT NULL,
            jeweling            DOUBLE PRECISION NOT NULL,
            scribing            DOUBLE PRECISION NOT NULL,
            tailoring           DOUBLE PRECISION NOT NULL,
            weaponsmithing      DOUBLE PRECISION NOT NULL,
            woodworking         DOUBLE PRECISION NOT NULL,
            mining              DOUBLE PRECISION NOT NULL,
            woodcutting         DOUBLE PRECISION NOT NULL,
            farming             DOUBLE PRECISION NOT NULL,
            fishing             DOUBLE PRECISION NOT NULL,
            dungeon_completions INTEGER NOT NULL,
            quest_completions   INTEGER NOT NULL,
            raid_completions    INTEGER NOT NULL,
            datetime            TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &[
        "unique_id",
        "character_uuid",
        "level",
        "xp",
        "wars",
        "playtime",
        "mobs_killed",
        "chests_found",
        "logins",
        "deaths",
        "discoveries",
        "gamemode",
        "alchemism",
        "armouring",
        "cooking",
        "jeweling",
        "scribing",
        "tailoring",
        "weaponsmithing",
        "woodworking",
        "mining",
        "woodcutting",
        "farming",
        "fishing",
        "dungeon_completions",
        "quest_completions",
        "raid_completions",
        "datetime",
    ];
    const KEY: &'static [&'static str] = &["unique_id"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.unique_id)
            .push_bind(self.character_uuid)
            .push_bind(self.level)
            .push_bind(self.xp)
            .push_bind(self.wars)
            .push_bind(self.playtime)
            .push_bind(self.mobs_killed)
            .push_bind(self.chests_found)
            .push_bind(self.logins)
            .push_bind(self.deaths)
            .push_bind(self.discoveries)
            .push_bind(self.gamemode.clone())
            .push_bind(self.alchemism)
            .push_bind(self.armouring)
            .push_bind(self.cooking)
            .push_bind(self.jeweling)
            .push_bind(self.scribing)
            .push_bind(self.tailoring)
            .push_bind(self.weaponsmithing)
            .push_bind(self.woodworking)
            .push_bind(self.mining)
            .push_bind(self.woodcutting)
            .push_bind(self.farming)
            .push_bind(self.fishing)
            .push_bind(self.dungeon_completions)
            .push_bind(self.quest_completions)
            .push_bind(self.raid_completions)
            .push_bind(self.datetime);
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "unique_id", *id);
    }
}

impl Entity for GuildInfo {
    type Id = String;

    const TABLE: &'static str = "guild_info";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS guild_info (
            name    VARCHAR(64) PRIMARY KEY,
            prefix  VARCHAR(8) NOT NULL,
            created TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["name", "prefix", "created"];
    const KEY: &'static [&'static str] = &["name"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.name.clone())
            .push_bind(self.prefix.clone())
            .push_bind(self.created);
    }

    fn push_key<'args>(id: &String, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "name", id.clone());
    }
}

impl Entity for GuildHistory {
    type Id = Uuid;

    const TABLE: &'static str = "guild_history";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS guild_history (
            unique_id      UUID PRIMARY KEY,
            name           VARCHAR(64) NOT NULL,
            level          INTEGER NOT NULL,
            territories    INTEGER NOT NULL,
            wars           INTEGER NOT NULL,
            member_total   INTEGER NOT NULL,
            online_members INTEGER NOT NULL,
            datetime       TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &[
        "unique_id",
        "name",
        "level",
        "territories",
        "wars",
        "member_total",
        "online_members",
        "datetime",
    ];
    const KEY: &'static [&'static str] = &["unique_id"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.unique_id)
            .push_bind(self.name.clone())
            .push_bind(self.level)
            .push_bind(self.territories)
            .push_bind(self.wars)
            .push_bind(self.member_total)
            .push_bind(self.online_members)
            .push_bind(self.datetime);
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "unique_id", *id);
    }
}

impl Entity for GuildMemberHistory {
    type Id = Uuid;

    const TABLE: &'static str = "guild_member_history";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS guild_member_history (
            unique_id   UUID PRIMARY KEY,
            uuid        UUID NOT NULL,
            contributed BIGINT NOT NULL,
            joined      TIMESTAMPTZ NOT NULL,
            datetime    TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] =
        &["unique_id", "uuid", "contributed", "joined", "datetime"];
    const KEY: &'static [&'static str] = &["unique_id"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.unique_id)
            .push_bind(self.uuid)
            .push_bind(self.contributed)
            .push_bind(self.joined)
            .push_bind(self.datetime);
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "unique_id", *id);
    }
}

impl Entity for OnlinePlayer {
    type Id = Uuid;

    const TABLE: &'static str = "online_players";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS online_players (
            uuid   UUID PRIMARY KEY,
            server VARCHAR(16) NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["uuid", "server"];
    const KEY: &'static [&'static str] = &["uuid"];
    const ON_CONFLICT: &'static str =
        "ON CONFLICT (uuid) DO UPDATE SET server = EXCLUDED.server";

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.uuid).push_bind(self.server.clone());
    }

    fn push_key<'args>(id: &Uuid, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "uuid", *id);
    }
}

impl Entity for PlayerActivityHistory {
    type Id = (Uuid, DateTime<Utc>);

    const TABLE: &'static str = "player_activity_history";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS player_activity_history (
            uuid           UUID NOT NULL,
            logon_datetime TIMESTAMPTZ NOT NULL,
            datetime       TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (uuid, logon_datetime)
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["uuid", "logon_datetime", "datetime"];
    const KEY: &'static [&'static str] = &["uuid", "logon_datetime"];

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.uuid)
            .push_bind(self.logon_datetime)
            .push_bind(self.datetime);
    }

    fn push_key<'args>(id: &(Uuid, DateTime<Utc>), qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "uuid", id.0);
        qb.push(" AND ");
        push_eq(qb, "logon_datetime", id.1);
    }
}

impl Entity for UptimeRecord {
    type Id = DateTime<Utc>;

    const TABLE: &'static str = "kans_uptime";
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS kans_uptime (
            start_time TIMESTAMPTZ PRIMARY KEY,
            stop_time  TIMESTAMPTZ NOT NULL
        )
    "#;
    const COLUMNS: &'static [&'static str] = &["start_time", "stop_time"];
    const KEY: &'static [&'static str] = &["start_time"];

    // One row per process run, stretched forward on every insert
    const ON_CONFLICT: &'static str = "ON CONFLICT (start_time) DO UPDATE \
         SET stop_time = GREATEST(kans_uptime.stop_time, EXCLUDED.stop_time)";

    fn bind_row<'args>(&self, mut row: Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.start_time).push_bind(self.stop_time);
    }

    fn push_key<'args>(id: &DateTime<Utc>, qb: &mut QueryBuilder<'args, Postgres>) {
        push_eq(qb, "start_time", *id);
    }
}
