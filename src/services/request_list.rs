use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::{Request, RequestKind};

/// Priority of ordinary follow-up requests
pub const DEFAULT_PRIORITY: i32 = 1;

/// Priority of the roster poll, which drives every other request
pub const ROSTER_PRIORITY: i32 = 0;

/// Eligibility of requests that may run right away
pub const IMMEDIATE: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// A request waiting in the [`RequestList`]
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub request: Request,
    pub eligible_at: DateTime<Utc>,
    pub priority: i32,
    pub enqueued_at: DateTime<Utc>,
    seq: u64,
}

impl PendingRequest {
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.eligible_at <= now
    }

    /// Insertion order within the list that produced this entry
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// Queued and eligible counts of one request kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub queued: usize,
    pub eligible: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<PendingRequest>,
    next_seq: u64,
}

/// Pending upstream requests, each eligible no earlier than its `eligible_at`.
///
/// Producers (presence tracking) and the fetch task share the list; every
/// operation runs inside the same critical section. Logically identical
/// requests are not de-duplicated.
#[derive(Debug, Default)]
pub struct RequestList {
    inner: Mutex<Inner>,
}

impl RequestList {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `request` with the default priority
    pub fn put(&self, eligible_at: DateTime<Utc>, request: Request) {
        self.put_with_priority(eligible_at, request, DEFAULT_PRIORITY);
    }

    pub fn put_with_priority(&self, eligible_at: DateTime<Utc>, request: Request, priority: i32) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push(PendingRequest {
            request,
            eligible_at,
            priority,
            enqueued_at: Utc::now(),
            seq,
        });
    }

    /// Removes and returns every entry eligible at `now`, ordered by priority,
    /// then eligibility, then insertion order
    pub fn pop_eligible(&self, now: DateTime<Utc>) -> Vec<PendingRequest> {
        let mut inner = self.lock();
        let (mut eligible, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.entries)
            .into_iter()
            .partition(|entry| entry.is_eligible(now));
        inner.entries = waiting;
        drop(inner);

        eligible.sort_by_key(|entry| (entry.priority, entry.eligible_at, entry.seq));
        eligible
    }

    /// Copy of all pending entries in insertion order
    pub fn snapshot(&self) -> Vec<PendingRequest> {
        self.lock().entries.clone()
    }

    /// Queued and eligible entries per request kind; every kind is present
    pub fn counts(&self, now: DateTime<Utc>) -> BTreeMap<RequestKind, KindCounts> {
        let mut counts: BTreeMap<RequestKind, KindCounts> = RequestKind::ALL
            .iter()
            .map(|kind| (*kind, KindCounts::default()))
            .collect();

        for entry in self.lock().entries.iter() {
            let bucket = counts.entry(entry.request.kind()).or_default();
            bucket.queued += 1;
            if entry.is_eligible(now) {
                bucket.eligible += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
