//! Unit tests for the pending request list

use chrono::Duration;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::HashSet;

use kans::api::{Request, RequestKind};
use kans::services::request_list::{RequestList, DEFAULT_PRIORITY, IMMEDIATE, ROSTER_PRIORITY};

use crate::common::fixtures::{at, t0};

fn player(id: &str) -> Request {
    Request::Player(id.to_string())
}

// =============================================================================
// pop_eligible
// =============================================================================

#[test]
fn test_pop_eligible_returns_only_due_entries() {
    let list = RequestList::new();
    list.put(at(-10), player("due"));
    list.put(at(10), player("later"));
    list.put(t0(), player("now"));

    let popped: Vec<Request> = list
        .pop_eligible(t0())
        .into_iter()
        .map(|entry| entry.request)
        .collect();

    assert_eq!(popped, vec![player("due"), player("now")]);
    assert_eq!(list.len(), 1);
    assert_eq!(list.snapshot()[0].request, player("later"));
}

#[test]
fn test_pop_eligible_never_returns_an_entry_twice() {
    let list = RequestList::new();
    list.put(IMMEDIATE, player("a"));

    assert_eq!(list.pop_eligible(t0()).len(), 1);
    assert!(list.pop_eligible(t0()).is_empty());
    assert!(list.is_empty());
}

#[test]
fn test_roster_priority_wins_over_earlier_player_requests() {
    let list = RequestList::new();
    list.put(at(-30), player("a"));
    list.put_with_priority(at(-5), Request::OnlinePlayers, ROSTER_PRIORITY);

    let popped = list.pop_eligible(t0());

    assert_eq!(popped[0].request, Request::OnlinePlayers);
    assert_eq!(popped[0].priority, ROSTER_PRIORITY);
    assert_eq!(popped[1].priority, DEFAULT_PRIORITY);
}

#[rstest]
#[case::same_time(vec![0, 0, 0], vec!["a", "b", "c"])]
#[case::earlier_first(vec![-1, -3, -2], vec!["b", "c", "a"])]
#[case::mixed(vec![-2, -5, -2], vec!["b", "a", "c"])]
fn test_equal_priority_orders_by_eligibility_then_insertion(
    #[case] offsets: Vec<i64>,
    #[case] expected: Vec<&str>,
) {
    let list = RequestList::new();
    for (offset, id) in offsets.iter().zip(["a", "b", "c"]) {
        list.put(at(*offset), player(id));
    }

    let popped: Vec<Request> = list
        .pop_eligible(t0())
        .into_iter()
        .map(|entry| entry.request)
        .collect();

    let expected: Vec<Request> = expected.into_iter().map(player).collect();
    assert_eq!(popped, expected);
}

#[test]
fn test_duplicates_are_not_collapsed() {
    let list = RequestList::new();
    list.put(IMMEDIATE, player("a"));
    list.put(IMMEDIATE, player("a"));

    assert_eq!(list.pop_eligible(t0()).len(), 2);
}

// =============================================================================
// Reporting
// =============================================================================

#[test]
fn test_counts_split_queued_and_eligible_per_kind() {
    let list = RequestList::new();
    list.put_with_priority(at(60), Request::OnlinePlayers, ROSTER_PRIORITY);
    list.put(IMMEDIATE, player("a"));
    list.put(at(60), player("b"));
    list.put(IMMEDIATE, Request::Guild("G".into()));

    let counts = list.counts(t0());

    assert_eq!(counts[&RequestKind::OnlinePlayers].queued, 1);
    assert_eq!(counts[&RequestKind::OnlinePlayers].eligible, 0);
    assert_eq!(counts[&RequestKind::Player].queued, 2);
    assert_eq!(counts[&RequestKind::Player].eligible, 1);
    assert_eq!(counts[&RequestKind::Guild].eligible, 1);
}

#[test]
fn test_snapshot_does_not_mutate() {
    let list = RequestList::new();
    list.put(IMMEDIATE, player("a"));

    let snapshot = list.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(list.len(), 1);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_pop_eligible_partitions_the_list(
        entries in prop::collection::vec((-100i64..100, 0i32..3), 0..60)
    ) {
        let list = RequestList::new();
        for (i, (offset, priority)) in entries.iter().enumerate() {
            list.put_with_priority(
                t0() + Duration::seconds(*offset),
                Request::Player(i.to_string()),
                *priority,
            );
        }

        let popped = list.pop_eligible(t0());
        let remaining = list.snapshot();

        prop_assert_eq!(popped.len() + remaining.len(), entries.len());
        prop_assert!(popped.iter().all(|entry| entry.eligible_at <= t0()));
        prop_assert!(remaining.iter().all(|entry| entry.eligible_at > t0()));

        // Sorted by (priority, eligible_at, insertion)
        for pair in popped.windows(2) {
            let a = (pair[0].priority, pair[0].eligible_at, pair[0].sequence());
            let b = (pair[1].priority, pair[1].eligible_at, pair[1].sequence());
            prop_assert!(a < b);
        }

        // Leftovers keep their insertion order
        for pair in remaining.windows(2) {
            prop_assert!(pair[0].sequence() < pair[1].sequence());
        }

        let unique: HashSet<u64> = popped.iter().map(|entry| entry.sequence()).collect();
        prop_assert_eq!(unique.len(), popped.len());
        prop_assert!(list.pop_eligible(t0()).is_empty());
    }
}
