//! Status report publishing.
//!
//! A [`StatusReport`] is a point-in-time summary of the poller. Each
//! [`ReportSink`] delivers it somewhere: the log always, a JSON webhook when
//! one is configured.

pub mod log_sink;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::api::RequestKind;
use crate::error::AppResult;

pub use log_sink::LogReportSink;
pub use webhook::WebhookReportSink;

// =============================================================================
// Status Report
// =============================================================================

/// Pending and running requests of one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestBucket {
    pub queued: usize,
    pub eligible: usize,
    pub running: usize,
}

/// Request timings of one kind over the recent window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RequestPerformance {
    /// Mean dispatch duration, 0 when nothing was recorded
    pub avg_duration_ms: f64,
    /// Requests completed within the window
    pub recent: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub runtime_secs: u64,
    /// Task name -> completion time of its latest successful run
    pub latest_runs: BTreeMap<String, Option<DateTime<Utc>>>,
    pub requests: BTreeMap<RequestKind, RequestBucket>,
    pub performance: BTreeMap<RequestKind, RequestPerformance>,
    pub overall_performance: RequestPerformance,
    pub rate_limit: RateLimitStatus,
    pub online_players: usize,
    pub online_guilds: usize,
    pub pending_batches: usize,
    /// `None` when the size query failed
    pub db_size_bytes: Option<i64>,
}

/// Span of request history summarized in [`RequestPerformance`]
pub const PERFORMANCE_WINDOW: Duration = Duration::from_secs(300);

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn format_runtime(secs: u64) -> String {
    format!(
        "{}d {:02}:{:02}:{:02}",
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    )
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status at {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  runtime: {}", format_runtime(self.runtime_secs))?;

        writeln!(f, "  tasks:")?;
        for (task, latest) in &self.latest_runs {
            match latest {
                Some(at) => writeln!(f, "    {:<18} {}", task, at.format("%Y-%m-%d %H:%M:%S"))?,
                None => writeln!(f, "    {:<18} never", task)?,
            }
        }

        writeln!(f, "  requests [queued | eligible | running]:")?;
        for (kind, bucket) in &self.requests {
            writeln!(
                f,
                "    {:<18} [ {:<4} | {:<4} | {:<4} ]",
                format!("{:?}", kind),
                bucket.queued,
                bucket.eligible,
                bucket.running
            )?;
        }

        writeln!(
            f,
            "  requests in the last {}m [avg ms | count]:",
            PERFORMANCE_WINDOW.as_secs() / 60
        )?;
        let rows = self
            .performance
            .iter()
            .map(|(kind, perf)| (format!("{:?}", kind), perf))
            .chain(std::iter::once(("All".to_string(), &self.overall_performance)));
        for (label, perf) in rows {
            writeln!(
                f,
                "    {:<18} [ {:>8.2} | {:<4} ]",
                label, perf.avg_duration_ms, perf.recent
            )?;
        }

        writeln!(
            f,
            "  rate limit: {}/{}",
            self.rate_limit.remaining, self.rate_limit.total
        )?;
        writeln!(
            f,
            "  online: {} players, {} guilds",
            self.online_players, self.online_guilds
        )?;
        writeln!(f, "  pending batches: {}", self.pending_batches)?;
        match self.db_size_bytes {
            Some(bytes) => write!(f, "  db size: {:.2} MB", bytes as f64 / BYTES_PER_MB),
            None => write!(f, "  db size: unknown"),
        }
    }
}

// =============================================================================
// Report Sink Trait
// =============================================================================

/// Destination of status reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, report: &StatusReport) -> AppResult<()>;
}
