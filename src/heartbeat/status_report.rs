use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::api_fetch::RequestStats;
use super::{ApiFetchTask, DbInsertTask, LatestRun, RunningRequests, Task};
use crate::db::Persistence;
use crate::error::AppResult;
use crate::services::rate_limit::RateLimiter;
use crate::services::report::{RateLimitStatus, ReportSink, RequestBucket, StatusReport};
use crate::services::request_list::RequestList;

/// Periodically summarizes the poller and publishes the summary to every sink
pub struct StatusReportTask {
    api_fetch: Arc<ApiFetchTask>,
    db_insert: Arc<DbInsertTask>,
    db: Arc<dyn Persistence>,
    request_list: Arc<RequestList>,
    rate_limiter: Arc<RateLimiter>,
    running: Arc<RunningRequests>,
    stats: Arc<RequestStats>,
    sinks: Vec<Box<dyn ReportSink>>,
    started_at: Instant,
    first_delay: Duration,
    interval: Duration,
    latest_run: LatestRun,
}

impl StatusReportTask {
    pub fn new(
        api_fetch: Arc<ApiFetchTask>,
        db_insert: Arc<DbInsertTask>,
        db: Arc<dyn Persistence>,
        request_list: Arc<RequestList>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        let running = api_fetch.running();
        let stats = api_fetch.stats();
        Self {
            api_fetch,
            db_insert,
            db,
            request_list,
            rate_limiter,
            running,
            stats,
            sinks: Vec::new(),
            started_at: Instant::now(),
            first_delay: Duration::from_secs(5),
            interval: Duration::from_secs(5),
            latest_run: LatestRun::default(),
        }
    }

    pub fn with_schedule(mut self, first_delay: Duration, interval: Duration) -> Self {
        self.first_delay = first_delay;
        self.interval = interval;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Collects the current status
    pub async fn collect(&self) -> StatusReport {
        let now = Utc::now();

        let requests = self
            .request_list
            .counts(now)
            .into_iter()
            .map(|(kind, counts)| {
                let bucket = RequestBucket {
                    queued: counts.queued,
                    eligible: counts.eligible,
                    running: self.running.get(kind),
                };
                (kind, bucket)
            })
            .collect();

        let latest_runs = BTreeMap::from([
            (self.api_fetch.name().to_string(), self.api_fetch.latest_run().get()),
            (self.db_insert.name().to_string(), self.db_insert.latest_run().get()),
            (self.name().to_string(), self.latest_run.get()),
        ]);

        let db_size_bytes = match self.db.total_size().await {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("Failed to read database size: {}", e);
                None
            }
        };

        StatusReport {
            generated_at: now,
            runtime_secs: self.started_at.elapsed().as_secs(),
            latest_runs,
            requests,
            performance: self.stats.by_kind(),
            overall_performance: self.stats.overall(),
            rate_limit: RateLimitStatus {
                remaining: self.rate_limiter.remaining(),
                total: self.rate_limiter.total(),
            },
            online_players: self.db_insert.online_players(),
            online_guilds: self.db_insert.online_guilds(),
            pending_batches: self.db_insert.pending_batches(),
            db_size_bytes,
        }
    }
}

#[async_trait]
impl Task for StatusReportTask {
    fn name(&self) -> &str {
        "StatusReportTask"
    }

    fn first_delay(&self) -> Duration {
        self.first_delay
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> AppResult<()> {
        let report = self.collect().await;

        for sink in &self.sinks {
            if let Err(e) = sink.publish(&report).await {
                log::error!("Failed to publish status report to {}: {}", sink.name(), e);
            }
        }
        Ok(())
    }

    fn latest_run(&self) -> &LatestRun {
        &self.latest_run
    }
}
