//! End-to-end polling against a scripted API and a real database

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use kans::api::{Request, Response};
use kans::heartbeat::{ApiFetchTask, DbInsertTask, Task};
use kans::services::rate_limit::RateLimiter;
use kans::services::request_list::RequestList;
use kans::services::response_list::ResponseList;

use crate::common::fixtures::{
    at, character, guild, guild_response, player, player_response, roster_response, uuid,
};
use crate::common::{FakeApi, TestDb};

#[tokio::test]
async fn test_roster_to_guild_members_end_to_end() {
    let test_db = TestDb::new().await;
    let db = Arc::new(test_db.database().await);

    let id = uuid(1).to_string();
    let mut p = player(uuid(1), true, Some("Guild"));
    p.characters.insert(uuid(500), character("ARCHER", 30));

    let api = Arc::new(FakeApi::new());
    api.respond(
        Request::OnlinePlayers,
        Response::OnlinePlayers(roster_response(&[id.as_str()], at(0), at(30))),
    );
    api.respond(
        Request::Player(id.clone()),
        Response::Player(player_response(p, at(0), at(60))),
    );
    api.respond(
        Request::Guild("Guild".into()),
        Response::Guild(guild_response(guild("Guild", 5, 3), at(0), at(60))),
    );

    let requests = Arc::new(RequestList::new());
    let responses = Arc::new(ResponseList::new());
    let insert = DbInsertTask::new(
        db.clone(),
        requests.clone(),
        responses.clone(),
        Duration::from_secs(480),
        16,
    );
    let fetch = ApiFetchTask::new(
        api.clone(),
        requests.clone(),
        responses.clone(),
        Arc::new(RateLimiter::new(180)),
        4,
    );

    insert.setup().await.unwrap();

    // Roster, then the player it lists, then the player's guild
    for _ in 0..3 {
        fetch.run().await.unwrap();
        insert.run().await.unwrap();
    }

    assert_eq!(insert.pending_batches(), 0);
    assert_eq!(insert.online_players(), 1);
    assert_eq!(insert.online_guilds(), 1);

    assert_eq!(db.online_players.count().await.unwrap(), 1);
    assert_eq!(db.player_activity_history.count().await.unwrap(), 1);
    assert_eq!(db.player_info.count().await.unwrap(), 1);
    // Refetched unchanged player collapses onto one history row
    assert_eq!(db.player_history.count().await.unwrap(), 1);
    assert_eq!(db.character_info.count().await.unwrap(), 1);
    assert_eq!(db.guild_info.count().await.unwrap(), 1);
    assert_eq!(db.guild_history.count().await.unwrap(), 1);
    assert_eq!(db.guild_member_history.count().await.unwrap(), 3);
    assert_eq!(db.uptime.count().await.unwrap(), 1);

    let calls = api.calls();
    assert!(calls.contains(&Request::Guild("Guild".into())));
    assert_eq!(
        calls.iter().filter(|r| **r == Request::OnlinePlayers).count(),
        3
    );
}
