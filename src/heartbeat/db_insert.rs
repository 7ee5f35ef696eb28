use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{LatestRun, Task};
use crate::api::{GuildResponse, OnlinePlayersResponse, PlayerResponse, Response};
use crate::db::Persistence;
use crate::error::AppResult;
use crate::models::{EntityBatch, UptimeRecord};
use crate::services::converter;
use crate::services::presence::PresenceTracker;
use crate::services::request_list::RequestList;
use crate::services::response_list::ResponseList;

/// Drains buffered responses, updates presence and persists the converted entities.
///
/// Responses are handled in a fixed order within a run: rosters, then
/// players, then guilds. Converted batches stay queued until the database
/// commits them, so a failing database delays writes instead of losing them.
/// On shutdown one last run converts and flushes whatever is still buffered.
pub struct DbInsertTask {
    db: Arc<dyn Persistence>,
    response_list: Arc<ResponseList>,
    presence: Mutex<PresenceTracker>,
    pending: Mutex<VecDeque<EntityBatch>>,
    max_pending: usize,
    started_at: DateTime<Utc>,
    first_delay: Duration,
    interval: Duration,
    latest_run: LatestRun,
}

impl DbInsertTask {
    /// Creates the task; building its presence tracker schedules the first roster poll
    pub fn new(
        db: Arc<dyn Persistence>,
        request_list: Arc<RequestList>,
        response_list: Arc<ResponseList>,
        player_requeue_grace: Duration,
        max_pending: usize,
    ) -> Self {
        Self {
            db,
            response_list,
            presence: Mutex::new(PresenceTracker::new(request_list, player_requeue_grace)),
            pending: Mutex::new(VecDeque::new()),
            max_pending: max_pending.max(1),
            started_at: Utc::now(),
            first_delay: Duration::from_secs(1),
            interval: Duration::from_secs(5),
            latest_run: LatestRun::default(),
        }
    }

    pub fn with_schedule(mut self, first_delay: Duration, interval: Duration) -> Self {
        self.first_delay = first_delay;
        self.interval = interval;
        self
    }

    fn presence(&self) -> MutexGuard<'_, PresenceTracker> {
        self.presence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<EntityBatch>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn online_players(&self) -> usize {
        self.presence().players.online_count()
    }

    pub fn online_guilds(&self) -> usize {
        self.presence().guilds.online_count()
    }

    /// Batches converted but not yet committed
    pub fn pending_batches(&self) -> usize {
        self.lock_pending().len()
    }

    /// Applies `responses` to presence state and converts them
    fn process(&self, responses: Vec<Response>, now: DateTime<Utc>) -> EntityBatch {
        let mut rosters: Vec<OnlinePlayersResponse> = Vec::new();
        let mut players: Vec<PlayerResponse> = Vec::new();
        let mut guilds: Vec<GuildResponse> = Vec::new();
        for response in responses {
            match response {
                Response::OnlinePlayers(resp) => rosters.push(resp),
                Response::Player(resp) => players.push(resp),
                Response::Guild(resp) => guilds.push(resp),
            }
        }

        let mut batch = EntityBatch::default();
        let mut presence = self.presence();

        // Rosters go first regardless of buffer order
        for resp in &rosters {
            presence.players.handle_roster(resp);
            batch.online_players = Some(converter::online_players(resp));
            batch.player_activity.extend(converter::player_activity(
                resp,
                presence.players.logged_on(),
                presence.players.logon_timestamps(),
            ));
        }

        if !players.is_empty() {
            let refs: Vec<&PlayerResponse> = players.iter().collect();
            presence.guilds.handle_players(&refs);

            for resp in &players {
                presence.players.requeue_player(resp);
                batch.player_info.push(converter::player_info(resp));
                batch.player_history.push(converter::player_history(resp));
                batch.character_info.extend(converter::character_info(resp));
                batch
                    .character_history
                    .extend(converter::character_history(resp));
            }
        }

        for resp in &guilds {
            presence.guilds.requeue_guild(resp);
            batch.guild_info.push(converter::guild_info(resp));
            batch.guild_history.push(converter::guild_history(resp));
            batch
                .guild_member_history
                .extend(converter::guild_member_history(resp));
        }

        batch.uptime.push(UptimeRecord {
            start_time: self.started_at,
            stop_time: now,
        });

        log::debug!(
            "Converted {} rosters, {} players, {} guilds into {} entities",
            rosters.len(),
            players.len(),
            guilds.len(),
            batch.len()
        );
        batch
    }

    fn enqueue(&self, batch: EntityBatch) {
        let mut pending = self.lock_pending();
        pending.push_back(batch);

        while pending.len() > self.max_pending {
            if let Some(dropped) = pending.pop_front() {
                log::error!(
                    "Pending batch backlog over {}, dropping oldest batch of {} entities",
                    self.max_pending,
                    dropped.len()
                );
            }
        }
    }

    /// Persists pending batches oldest first, stopping at the first failure
    async fn flush(&self) -> AppResult<()> {
        loop {
            let Some(batch) = self.lock_pending().pop_front() else {
                return Ok(());
            };

            if let Err(e) = self.db.persist(&batch).await {
                let mut pending = self.lock_pending();
                pending.push_front(batch);
                log::warn!("Persist failed, {} batches pending", pending.len());
                return Err(e);
            }
        }
    }
}

#[async_trait]
impl Task for DbInsertTask {
    fn name(&self) -> &str {
        "DbInsertTask"
    }

    fn first_delay(&self) -> Duration {
        self.first_delay
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn setup(&self) -> AppResult<()> {
        self.db.create_schema().await
    }

    async fn teardown(&self) {
        let buffered = self.response_list.len();
        if let Err(e) = self.run().await {
            let pending = self.lock_pending();
            log::error!(
                "Final flush failed ({}), dropping {} batches of {} entities",
                e,
                pending.len(),
                pending.iter().map(EntityBatch::len).sum::<usize>()
            );
            return;
        }
        log::info!("Final flush persisted {} buffered responses", buffered);
    }

    async fn run(&self) -> AppResult<()> {
        let responses = self.response_list.drain();
        let batch = self.process(responses, Utc::now());
        self.enqueue(batch);
        self.flush().await
    }

    fn latest_run(&self) -> &LatestRun {
        &self.latest_run
    }
}
