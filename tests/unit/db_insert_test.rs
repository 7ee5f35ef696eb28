//! Unit tests for the insert task: phase ordering, presence updates and
//! retention of unpersisted batches

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use kans::api::{Request, Response};
use kans::heartbeat::{DbInsertTask, Task};
use kans::services::request_list::{RequestList, IMMEDIATE};
use kans::services::response_list::ResponseList;

use crate::common::fixtures::{
    at, guild, guild_response, player, player_response, roster_response, uuid,
};
use crate::common::MemoryPersistence;

struct Harness {
    db: Arc<MemoryPersistence>,
    requests: Arc<RequestList>,
    responses: Arc<ResponseList>,
    task: DbInsertTask,
}

fn harness(max_pending: usize) -> Harness {
    let db = Arc::new(MemoryPersistence::new());
    let requests = Arc::new(RequestList::new());
    let responses = Arc::new(ResponseList::new());
    let task = DbInsertTask::new(
        db.clone(),
        requests.clone(),
        responses.clone(),
        Duration::from_secs(480),
        max_pending,
    );
    // Discard the initial roster poll
    requests.pop_eligible(at(0));

    Harness {
        db,
        requests,
        responses,
        task,
    }
}

#[tokio::test]
async fn test_setup_creates_schema() {
    let h = harness(10);
    h.task.setup().await.unwrap();
    assert_eq!(h.db.schema_calls(), 1);
}

#[tokio::test]
async fn test_roster_processed_before_players_regardless_of_buffer_order() {
    let h = harness(10);
    let c = uuid(3).to_string();

    // Player response arrives in the buffer before the roster that lists it
    h.responses.push(Response::Player(player_response(
        player(uuid(3), true, Some("G")),
        at(0),
        at(60),
    )));
    h.responses
        .push(Response::OnlinePlayers(roster_response(&[c.as_str()], at(0), at(30))));

    h.task.run().await.unwrap();

    let pending: Vec<Request> = h.requests.snapshot().into_iter().map(|e| e.request).collect();
    assert_eq!(
        pending,
        vec![
            // From the roster
            Request::Player(c.clone()),
            Request::OnlinePlayers,
            // From the player response
            Request::Guild("G".into()),
            Request::Player(c.clone()),
        ]
    );

    let batch = &h.db.committed()[0];
    assert_eq!(batch.player_activity.len(), 1);
    assert_eq!(batch.player_activity[0].uuid, uuid(3));
    assert_eq!(batch.online_players.as_ref().map(Vec::len), Some(1));
    assert_eq!(batch.player_info.len(), 1);
    assert_eq!(h.task.online_players(), 1);
    assert_eq!(h.task.online_guilds(), 1);
}

#[tokio::test]
async fn test_guild_responses_converted_and_requeued() {
    let h = harness(10);
    h.responses
        .push(Response::Guild(guild_response(guild("G", 40, 5), at(0), at(60))));

    h.task.run().await.unwrap();

    let batch = &h.db.committed()[0];
    assert_eq!(batch.guild_info.len(), 1);
    assert_eq!(batch.guild_history.len(), 1);
    assert_eq!(batch.guild_member_history.len(), 5);

    let pending = h.requests.snapshot();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request, Request::Guild("G".into()));
    assert_eq!(pending[0].eligible_at, at(60));
}

#[tokio::test]
async fn test_every_run_records_uptime() {
    let h = harness(10);

    h.task.run().await.unwrap();
    h.task.run().await.unwrap();

    let committed = h.db.committed();
    assert_eq!(committed.len(), 2);
    assert_eq!(committed[0].uptime.len(), 1);
    assert_eq!(committed[0].uptime[0].start_time, committed[1].uptime[0].start_time);
    assert!(committed[1].uptime[0].stop_time >= committed[0].uptime[0].stop_time);
}

#[tokio::test]
async fn test_failed_persist_keeps_batch_for_next_run() {
    let h = harness(10);
    h.db.set_failing(true);
    h.responses
        .push(Response::Guild(guild_response(guild("Old", 1, 1), at(0), at(60))));

    assert!(h.task.run().await.is_err());
    assert_eq!(h.task.pending_batches(), 1);
    // The response is consumed even though nothing was written
    assert!(h.responses.is_empty());

    h.db.set_failing(false);
    h.responses
        .push(Response::Guild(guild_response(guild("New", 1, 1), at(10), at(70))));
    h.task.run().await.unwrap();

    let committed = h.db.committed();
    assert_eq!(committed.len(), 2);
    assert_eq!(committed[0].guild_info[0].name, "Old");
    assert_eq!(committed[1].guild_info[0].name, "New");
    assert_eq!(h.task.pending_batches(), 0);
}

#[tokio::test]
async fn test_backlog_drops_oldest_batch_when_full() {
    let h = harness(2);
    h.db.set_failing(true);

    for name in ["A", "B", "C"] {
        h.responses
            .push(Response::Guild(guild_response(guild(name, 1, 1), at(0), at(60))));
        assert!(h.task.run().await.is_err());
    }
    assert_eq!(h.task.pending_batches(), 2);

    // The recovery run queues its own batch first, which pushes out "B" too
    h.db.set_failing(false);
    h.task.run().await.unwrap();
    assert_eq!(h.db.committed().len(), 2);

    let names: Vec<String> = h
        .db
        .committed()
        .iter()
        .flat_map(|batch| batch.guild_info.iter().map(|g| g.name.clone()))
        .collect();
    assert_eq!(names, vec!["C".to_string()]);
}

#[tokio::test]
async fn test_presence_updated_once_per_response_despite_failures() {
    let h = harness(10);
    h.db.set_failing(true);
    let a = uuid(1).to_string();
    h.responses
        .push(Response::OnlinePlayers(roster_response(&[a.as_str()], at(0), at(30))));

    assert!(h.task.run().await.is_err());
    assert!(h.task.run().await.is_err());

    let follow_ups = h
        .requests
        .snapshot()
        .into_iter()
        .filter(|e| e.request == Request::Player(a.clone()) && e.eligible_at == IMMEDIATE)
        .count();
    assert_eq!(follow_ups, 1);
}

#[tokio::test]
async fn test_latest_roster_of_a_run_replaces_earlier_one() {
    let h = harness(10);
    let (a, b) = (uuid(1).to_string(), uuid(2).to_string());
    h.responses
        .push(Response::OnlinePlayers(roster_response(&[a.as_str()], at(0), at(30))));
    h.responses
        .push(Response::OnlinePlayers(roster_response(&[b.as_str()], at(30), at(60))));

    h.task.run().await.unwrap();
    h.task.run().await.unwrap();

    let committed = h.db.committed();
    let roster = committed[0].online_players.as_ref().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].uuid, uuid(2));
    // No roster in the second run: the stored one is left alone
    assert_eq!(committed[1].online_players, None);
}

#[tokio::test]
async fn test_teardown_flushes_buffered_responses() {
    let h = harness(10);
    h.responses
        .push(Response::Guild(guild_response(guild("Late", 1, 1), at(0), at(60))));

    h.task.teardown().await;

    let committed = h.db.committed();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].guild_info[0].name, "Late");
    assert!(h.responses.is_empty());
    assert_eq!(h.task.pending_batches(), 0);
}

#[tokio::test]
async fn test_teardown_with_failing_database_keeps_backlog() {
    let h = harness(10);
    h.db.set_failing(true);
    h.responses
        .push(Response::Guild(guild_response(guild("A", 1, 1), at(0), at(60))));
    assert!(h.task.run().await.is_err());

    h.task.teardown().await;

    assert!(h.db.committed().is_empty());
    assert_eq!(h.task.pending_batches(), 2);
}
