use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use super::repository::Repository;
use super::{DbPool, Persistence};
use crate::error::AppResult;
use crate::models::{
    CharacterHistory, CharacterInfo, EntityBatch, GuildHistory, GuildInfo, GuildMemberHistory,
    OnlinePlayer, PlayerActivityHistory, PlayerHistory, PlayerInfo, UptimeRecord,
};

/// Postgres-backed [`Persistence`], one repository per table
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    pub player_info: Repository<PlayerInfo>,
    pub player_history: Repository<PlayerHistory>,
    pub character_info: Repository<CharacterInfo>,
    pub character_history: Repository<CharacterHistory>,
    pub guild_info: Repository<GuildInfo>,
    pub guild_history: Repository<GuildHistory>,
    pub guild_member_history: Repository<GuildMemberHistory>,
    pub online_players: Repository<OnlinePlayer>,
    pub player_activity_history: Repository<PlayerActivityHistory>,
    pub uptime: Repository<UptimeRecord>,
}

impl Database {
    pub fn new(pool: DbPool) -> Self {
        Self {
            player_info: Repository::new(pool.clone()),
            player_history: Repository::new(pool.clone()),
            character_info: Repository::new(pool.clone()),
            character_history: Repository::new(pool.clone()),
            guild_info: Repository::new(pool.clone()),
            guild_history: Repository::new(pool.clone()),
            guild_member_history: Repository::new(pool.clone()),
            online_players: Repository::new(pool.clone()),
            player_activity_history: Repository::new(pool.clone()),
            uptime: Repository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Last profile of each player in `rows`; an upsert statement may touch a row only once
fn latest_per_player(rows: &[PlayerInfo]) -> Vec<PlayerInfo> {
    let mut latest: HashMap<Uuid, &PlayerInfo> = HashMap::new();
    for row in rows {
        latest.insert(row.uuid, row);
    }
    latest.into_values().cloned().collect()
}

#[async_trait]
impl Persistence for Database {
    async fn create_schema(&self) -> AppResult<()> {
        log::info!("Creating database schema...");

        self.player_info.create_schema().await?;
        self.player_history.create_schema().await?;
        self.character_info.create_schema().await?;
        self.character_history.create_schema().await?;
        self.guild_info.create_schema().await?;
        self.guild_history.create_schema().await?;
        self.guild_member_history.create_schema().await?;
        self.online_players.create_schema().await?;
        self.player_activity_history.create_schema().await?;
        self.uptime.create_schema().await?;

        log::info!("Database schema ready");
        Ok(())
    }

    async fn persist(&self, batch: &EntityBatch) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let player_info = latest_per_player(&batch.player_info);
        let mut written = Repository::insert_with(&mut *tx, &player_info).await?;
        written += Repository::insert_with(&mut *tx, &batch.character_info).await?;
        written += Repository::insert_with(&mut *tx, &batch.guild_info).await?;
        if let Some(roster) = &batch.online_players {
            written += Repository::replace_with(&mut *tx, roster).await?;
        }
        written += Repository::insert_with(&mut *tx, &batch.player_activity).await?;
        written += Repository::insert_with(&mut *tx, &batch.player_history).await?;
        written += Repository::insert_with(&mut *tx, &batch.character_history).await?;
        written += Repository::insert_with(&mut *tx, &batch.guild_history).await?;
        written += Repository::insert_with(&mut *tx, &batch.guild_member_history).await?;
        written += Repository::insert_with(&mut *tx, &batch.uptime).await?;

        tx.commit().await?;

        log::debug!(
            "Persisted {} of {} entities ({} unchanged)",
            written,
            batch.len(),
            (batch.len() as u64).saturating_sub(written)
        );
        Ok(written)
    }

    async fn total_size(&self) -> AppResult<i64> {
        let sizes = [
            self.player_info.table_size().await?,
            self.player_history.table_size().await?,
            self.character_info.table_size().await?,
            self.character_history.table_size().await?,
            self.guild_info.table_size().await?,
            self.guild_history.table_size().await?,
            self.guild_member_history.table_size().await?,
            self.online_players.table_size().await?,
            self.player_activity_history.table_size().await?,
            self.uptime.table_size().await?,
        ];
        Ok(sizes.iter().sum())
    }
}
