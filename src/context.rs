use std::sync::Arc;

use crate::api::StatsApi;
use crate::config::Config;
use crate::db::Persistence;
use crate::error::AppResult;
use crate::heartbeat::{ApiFetchTask, DbInsertTask, Heartbeat, StatusReportTask};
use crate::services::rate_limit::RateLimiter;
use crate::services::report::{LogReportSink, WebhookReportSink};
use crate::services::request_list::RequestList;
use crate::services::response_list::ResponseList;

/// Shared handles of one poller process
pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn StatsApi>,
    pub db: Arc<dyn Persistence>,
    pub request_list: Arc<RequestList>,
    pub response_list: Arc<ResponseList>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    pub fn new(config: Config, api: Arc<dyn StatsApi>, db: Arc<dyn Persistence>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.api.initial_rate_limit));
        Self {
            config,
            api,
            db,
            request_list: Arc::new(RequestList::new()),
            response_list: Arc::new(ResponseList::new()),
            rate_limiter,
        }
    }

    /// Wires the fetch, insert and report tasks into a heartbeat
    pub fn build_heartbeat(&self) -> AppResult<Heartbeat> {
        let schedule = &self.config.heartbeat;

        let api_fetch = Arc::new(
            ApiFetchTask::new(
                self.api.clone(),
                self.request_list.clone(),
                self.response_list.clone(),
                self.rate_limiter.clone(),
                self.config.api.max_concurrency,
            )
            .with_schedule(schedule.api_fetch_first_delay, schedule.api_fetch_interval)
            .with_roster_retry(self.config.api.roster_retry),
        );

        let db_insert = Arc::new(
            DbInsertTask::new(
                self.db.clone(),
                self.request_list.clone(),
                self.response_list.clone(),
                self.config.presence.player_requeue_grace,
                schedule.max_pending_batches,
            )
            .with_schedule(schedule.db_insert_first_delay, schedule.db_insert_interval),
        );

        let mut status_report = StatusReportTask::new(
            api_fetch.clone(),
            db_insert.clone(),
            self.db.clone(),
            self.request_list.clone(),
            self.rate_limiter.clone(),
        )
        .with_schedule(
            schedule.status_report_first_delay,
            schedule.status_report_interval,
        )
        .with_sink(Box::new(LogReportSink));

        if let Some(ref url) = self.config.report.webhook_url {
            status_report = status_report.with_sink(Box::new(WebhookReportSink::new(url.clone())?));
        }

        let mut heartbeat = Heartbeat::new();
        heartbeat
            .register(api_fetch)
            .register(db_insert)
            .register(Arc::new(status_report));
        Ok(heartbeat)
    }
}
