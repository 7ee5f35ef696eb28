use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::{LatestRun, Task};
use crate::api::{Request, RequestKind, StatsApi};
use crate::error::AppResult;
use crate::services::rate_limit::RateLimiter;
use crate::services::report::{RequestPerformance, PERFORMANCE_WINDOW};
use crate::services::request_list::{PendingRequest, RequestList, ROSTER_PRIORITY};
use crate::services::response_list::ResponseList;

/// In-flight request counts per kind
#[derive(Debug, Default)]
pub struct RunningRequests {
    counts: Mutex<BTreeMap<RequestKind, usize>>,
}

impl RunningRequests {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<RequestKind, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts one request of `kind` as running until the guard is dropped
    pub fn start(&self, kind: RequestKind) -> RunningGuard<'_> {
        *self.lock().entry(kind).or_default() += 1;
        RunningGuard {
            running: self,
            kind,
        }
    }

    pub fn get(&self, kind: RequestKind) -> usize {
        self.lock().get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.lock().values().sum()
    }
}

pub struct RunningGuard<'a> {
    running: &'a RunningRequests,
    kind: RequestKind,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if let Some(count) = self.running.lock().get_mut(&self.kind) {
            *count = count.saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    finished_at: Instant,
    kind: RequestKind,
    duration: Duration,
}

/// Dispatch durations of the requests completed within [`PERFORMANCE_WINDOW`]
#[derive(Debug, Default)]
pub struct RequestStats {
    samples: Mutex<VecDeque<Sample>>,
}

impl RequestStats {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Sample>> {
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        while samples
            .front()
            .is_some_and(|s| now.saturating_duration_since(s.finished_at) > PERFORMANCE_WINDOW)
        {
            samples.pop_front();
        }
        samples
    }

    pub fn record(&self, kind: RequestKind, duration: Duration) {
        self.lock().push_back(Sample {
            finished_at: Instant::now(),
            kind,
            duration,
        });
    }

    /// Per-kind performance; every kind is present
    pub fn by_kind(&self) -> BTreeMap<RequestKind, RequestPerformance> {
        let samples = self.lock();
        RequestKind::ALL
            .iter()
            .map(|kind| {
                let perf = summarize(samples.iter().filter(|s| s.kind == *kind));
                (*kind, perf)
            })
            .collect()
    }

    pub fn overall(&self) -> RequestPerformance {
        summarize(self.lock().iter())
    }
}

fn summarize<'a>(samples: impl Iterator<Item = &'a Sample>) -> RequestPerformance {
    let (recent, total) = samples.fold((0usize, Duration::ZERO), |(n, sum), s| {
        (n + 1, sum + s.duration)
    });
    RequestPerformance {
        avg_duration_ms: if recent == 0 {
            0.0
        } else {
            total.as_secs_f64() * 1000.0 / recent as f64
        },
        recent,
    }
}

/// Dispatches every eligible pending request and buffers the responses.
///
/// A failed roster poll is queued again after `roster_retry`; failed player
/// and guild requests are dropped.
pub struct ApiFetchTask {
    api: Arc<dyn StatsApi>,
    request_list: Arc<RequestList>,
    response_list: Arc<ResponseList>,
    rate_limiter: Arc<RateLimiter>,
    running: Arc<RunningRequests>,
    stats: Arc<RequestStats>,
    max_concurrency: usize,
    roster_retry: Duration,
    first_delay: Duration,
    interval: Duration,
    latest_run: LatestRun,
}

impl ApiFetchTask {
    pub fn new(
        api: Arc<dyn StatsApi>,
        request_list: Arc<RequestList>,
        response_list: Arc<ResponseList>,
        rate_limiter: Arc<RateLimiter>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            api,
            request_list,
            response_list,
            rate_limiter,
            running: Arc::new(RunningRequests::default()),
            stats: Arc::new(RequestStats::default()),
            max_concurrency: max_concurrency.max(1),
            roster_retry: Duration::from_secs(5),
            first_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
            latest_run: LatestRun::default(),
        }
    }

    pub fn with_schedule(mut self, first_delay: Duration, interval: Duration) -> Self {
        self.first_delay = first_delay;
        self.interval = interval;
        self
    }

    pub fn with_roster_retry(mut self, delay: Duration) -> Self {
        self.roster_retry = delay;
        self
    }

    pub fn running(&self) -> Arc<RunningRequests> {
        self.running.clone()
    }

    pub fn stats(&self) -> Arc<RequestStats> {
        self.stats.clone()
    }

    fn retry_roster(&self) {
        let delay = chrono::Duration::from_std(self.roster_retry).unwrap_or(chrono::Duration::zero());
        self.request_list
            .put_with_priority(Utc::now() + delay, Request::OnlinePlayers, ROSTER_PRIORITY);
    }

    /// Performs one request; returns whether it produced a response
    async fn fetch(&self, entry: PendingRequest) -> bool {
        let _running = self.running.start(entry.request.kind());

        self.rate_limiter.limit().await;

        let started = Instant::now();
        let outcome = entry.request.dispatch(self.api.as_ref()).await;
        self.stats.record(entry.request.kind(), started.elapsed());

        match outcome {
            Ok(response) => {
                self.rate_limiter.update(&response.headers().quota);
                self.response_list.push(response);
                true
            }
            Err(e) => {
                if let Some(quota) = e.quota() {
                    self.rate_limiter.update(&quota);
                }
                log::warn!("Request for {} failed: {}", entry.request, e);
                if entry.request == Request::OnlinePlayers {
                    self.retry_roster();
                }
                false
            }
        }
    }
}

#[async_trait]
impl Task for ApiFetchTask {
    fn name(&self) -> &str {
        "ApiFetchTask"
    }

    fn first_delay(&self) -> Duration {
        self.first_delay
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> AppResult<()> {
        let batch = self.request_list.pop_eligible(Utc::now());
        if batch.is_empty() {
            return Ok(());
        }

        let total = batch.len();
        let failed = AtomicUsize::new(0);

        stream::iter(batch)
            .for_each_concurrent(self.max_concurrency, |entry| {
                let failed = &failed;
                async move {
                    if !self.fetch(entry).await {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        let failed = failed.into_inner();
        log::debug!(
            "Dispatched {} requests ({} failed), rate limit remaining {}",
            total,
            failed,
            self.rate_limiter.remaining()
        );
        Ok(())
    }

    fn latest_run(&self) -> &LatestRun {
        &self.latest_run
    }
}
