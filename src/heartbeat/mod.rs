//! Fixed-delay task driver.
//!
//! Every registered [`Task`] gets its own worker. A worker sleeps for the
//! task's first delay, runs it, then sleeps for the interval measured from
//! the end of that run, so a task never overlaps itself while different
//! tasks run concurrently. Failed or panicking runs are logged and the task
//! is scheduled again.

pub mod api_fetch;
pub mod db_insert;
pub mod status_report;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{AppError, AppResult};

pub use api_fetch::{ApiFetchTask, RequestStats, RunningRequests};
pub use db_insert::DbInsertTask;
pub use status_report::StatusReportTask;

/// A recurring unit of work driven by the [`Heartbeat`]
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// Delay before the first run
    fn first_delay(&self) -> Duration;

    /// Delay between the end of one run and the start of the next
    fn interval(&self) -> Duration;

    /// Awaited once before any task is scheduled; an error aborts startup
    async fn setup(&self) -> AppResult<()> {
        Ok(())
    }

    /// Awaited once after the task's worker has stopped
    async fn teardown(&self) {}

    async fn run(&self) -> AppResult<()>;

    /// Completion time of the latest successful run
    fn latest_run(&self) -> &LatestRun;
}

/// Completion time of a task's latest successful run
#[derive(Debug, Default)]
pub struct LatestRun(Mutex<Option<DateTime<Utc>>>);

impl LatestRun {
    pub fn mark(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Heartbeat {
    tasks: Vec<Arc<dyn Task>>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            tasks: Vec::new(),
            shutdown,
            handles: Vec::new(),
        }
    }

    pub fn register(&mut self, task: Arc<dyn Task>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Sets up every task, then spawns one worker per task
    pub async fn start(&mut self) -> AppResult<()> {
        if self.is_running() {
            return Err(AppError::Internal("heartbeat already started".to_string()));
        }

        for task in &self.tasks {
            task.setup().await.map_err(|e| {
                log::error!("Setup of {} failed: {}", task.name(), e);
                e
            })?;
        }

        self.shutdown.send_replace(false);
        for task in &self.tasks {
            let handle = tokio::spawn(run_worker(task.clone(), self.shutdown.subscribe()));
            self.handles.push(handle);
        }

        log::info!("Heartbeat started with {} tasks", self.tasks.len());
        Ok(())
    }

    /// Cancels every pending timer and waits for in-flight runs and teardowns
    pub async fn stop(&mut self) {
        self.shutdown.send_replace(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                log::error!("Heartbeat worker terminated abnormally: {}", e);
            }
        }

        log::info!("Heartbeat stopped");
    }
}

async fn run_worker(task: Arc<dyn Task>, mut shutdown: watch::Receiver<bool>) {
    log::info!(
        "Scheduling {} (first delay {:?}, interval {:?})",
        task.name(),
        task.first_delay(),
        task.interval()
    );

    let mut delay = task.first_delay();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stopped| *stopped) => break,
            _ = tokio::time::sleep(delay) => {}
        }

        run_once(task.as_ref()).await;
        delay = task.interval();
    }

    task.teardown().await;
    log::debug!("{} stopped", task.name());
}

/// Runs `task` once, logging the outcome; returns whether it succeeded
pub async fn run_once(task: &dyn Task) -> bool {
    let started = Instant::now();
    let outcome = AssertUnwindSafe(task.run()).catch_unwind().await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(())) => {
            task.latest_run().mark(Utc::now());
            log::debug!("{} finished in {:.3}s", task.name(), elapsed.as_secs_f64());
            true
        }
        Ok(Err(e)) => {
            log::error!(
                "{} failed after {:.3}s [{}]: {}",
                task.name(),
                elapsed.as_secs_f64(),
                e.kind(),
                e
            );
            false
        }
        Err(panic) => {
            log::error!(
                "{} panicked after {:.3}s: {}",
                task.name(),
                elapsed.as_secs_f64(),
                panic_message(panic.as_ref())
            );
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
