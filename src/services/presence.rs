//! Online player and guild tracking.
//!
//! Both managers are driven by the insert task, which is their only writer.
//! They react to responses by scheduling follow-up requests on the shared
//! [`RequestList`].

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{GuildResponse, OnlinePlayersResponse, PlayerResponse, Request};
use crate::services::request_list::{RequestList, IMMEDIATE, ROSTER_PRIORITY};

/// Players that appeared and disappeared between two roster snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDiff {
    pub logged_on: BTreeSet<String>,
    pub logged_off: BTreeSet<String>,
}

pub struct OnlinePlayersManager {
    request_list: Arc<RequestList>,
    grace: chrono::Duration,
    online: HashSet<String>,
    logged_on: HashSet<String>,
    logon_timestamps: HashMap<String, DateTime<Utc>>,
}

impl OnlinePlayersManager {
    /// Creates the manager and schedules the first roster poll
    pub fn new(request_list: Arc<RequestList>, player_requeue_grace: Duration) -> Self {
        request_list.put_with_priority(IMMEDIATE, Request::OnlinePlayers, ROSTER_PRIORITY);

        Self {
            request_list,
            grace: chrono::Duration::from_std(player_requeue_grace)
                .unwrap_or(chrono::Duration::zero()),
            online: HashSet::new(),
            logged_on: HashSet::new(),
            logon_timestamps: HashMap::new(),
        }
    }

    /// Diffs the roster against the previous one, schedules detail polls for
    /// players that just logged on and requeues the roster poll itself
    pub fn handle_roster(&mut self, resp: &OnlinePlayersResponse) -> RosterDiff {
        let current: HashSet<String> = resp.body.player_ids().map(str::to_owned).collect();

        let logged_off: BTreeSet<String> = self.online.difference(&current).cloned().collect();
        let logged_on: BTreeSet<String> = current.difference(&self.online).cloned().collect();

        for id in &logged_off {
            self.logon_timestamps.remove(id);
        }
        for id in &logged_on {
            self.logon_timestamps
                .insert(id.clone(), resp.headers.observed_at);
            self.request_list.put(IMMEDIATE, Request::Player(id.clone()));
        }

        self.logged_on = logged_on.iter().cloned().collect();
        self.online = current;

        self.request_list.put_with_priority(
            resp.headers.expires_at,
            Request::OnlinePlayers,
            ROSTER_PRIORITY,
        );

        if !logged_on.is_empty() || !logged_off.is_empty() {
            log::debug!(
                "Roster: {} online, {} logged on, {} logged off",
                self.online.len(),
                logged_on.len(),
                logged_off.len()
            );
        }

        RosterDiff {
            logged_on,
            logged_off,
        }
    }

    /// Polls the player again after its response expires, while it stays online
    pub fn requeue_player(&self, resp: &PlayerResponse) {
        if !resp.body.online {
            return;
        }
        self.request_list.put(
            resp.headers.expires_at + self.grace,
            Request::Player(resp.body.uuid.to_string()),
        );
    }

    /// Players that logged on in the latest roster diff
    pub fn logged_on(&self) -> &HashSet<String> {
        &self.logged_on
    }

    pub fn logon_timestamps(&self) -> &HashMap<String, DateTime<Utc>> {
        &self.logon_timestamps
    }

    pub fn is_online(&self, id: &str) -> bool {
        self.online.contains(id)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}

/// Guilds that came online and went offline within one batch of player responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildDiff {
    pub logged_on: BTreeSet<String>,
    pub logged_off: BTreeSet<String>,
}

pub struct OnlineGuildsManager {
    request_list: Arc<RequestList>,
    /// Guild name -> online members seen through player responses
    online_guilds: HashMap<String, HashSet<String>>,
}

impl OnlineGuildsManager {
    pub fn new(request_list: Arc<RequestList>) -> Self {
        Self {
            request_list,
            online_guilds: HashMap::new(),
        }
    }

    /// Updates guild membership from a batch of player responses and
    /// schedules one detail poll per guild that came online
    pub fn handle_players(&mut self, responses: &[&PlayerResponse]) -> GuildDiff {
        let mut diff = GuildDiff::default();

        for resp in responses {
            let Some(guild) = resp.body.guild.as_ref() else {
                continue;
            };
            let player = resp.body.uuid.to_string();

            // A tracked guild keeps its member set until that set empties
            if resp.body.online {
                if !self.online_guilds.contains_key(&guild.name) {
                    self.online_guilds
                        .insert(guild.name.clone(), HashSet::from([player]));
                    diff.logged_on.insert(guild.name.clone());
                }
                continue;
            }

            let Some(members) = self.online_guilds.get_mut(&guild.name) else {
                continue;
            };
            if members.remove(&player) && members.is_empty() {
                self.online_guilds.remove(&guild.name);
                diff.logged_off.insert(guild.name.clone());
            }
        }

        for name in &diff.logged_on {
            self.request_list.put(IMMEDIATE, Request::Guild(name.clone()));
        }

        diff
    }

    /// Polls the guild again after its response expires, while any member is online
    pub fn requeue_guild(&self, resp: &GuildResponse) {
        if resp.body.members.online_count() == 0 {
            return;
        }
        self.request_list
            .put(resp.headers.expires_at, Request::Guild(resp.body.name.clone()));
    }

    pub fn online_members(&self, guild: &str) -> Option<&HashSet<String>> {
        self.online_guilds.get(guild)
    }

    pub fn online_count(&self) -> usize {
        self.online_guilds.len()
    }
}

/// Player and guild presence, mutated only by the insert task
pub struct PresenceTracker {
    pub players: OnlinePlayersManager,
    pub guilds: OnlineGuildsManager,
}

impl PresenceTracker {
    pub fn new(request_list: Arc<RequestList>, player_requeue_grace: Duration) -> Self {
        Self {
            players: OnlinePlayersManager::new(request_list.clone(), player_requeue_grace),
            guilds: OnlineGuildsManager::new(request_list),
        }
    }
}
