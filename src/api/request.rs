use serde::Serialize;
use std::fmt;

use super::{
    ApiResult, GuildResponse, OnlinePlayersResponse, PlayerResponse, ResponseHeaders, StatsApi,
};

/// An upstream operation together with its bound argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    OnlinePlayers,
    Player(String),
    Guild(String),
}

/// Operation kind, used to bucket requests in status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    OnlinePlayers,
    Player,
    Guild,
}

impl RequestKind {
    pub const ALL: [RequestKind; 3] = [
        RequestKind::OnlinePlayers,
        RequestKind::Player,
        RequestKind::Guild,
    ];
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::OnlinePlayers => RequestKind::OnlinePlayers,
            Request::Player(_) => RequestKind::Player,
            Request::Guild(_) => RequestKind::Guild,
        }
    }

    /// Performs the call against `api`
    pub async fn dispatch(&self, api: &dyn StatsApi) -> ApiResult<Response> {
        match self {
            Request::OnlinePlayers => api.fetch_online_roster().await.map(Response::OnlinePlayers),
            Request::Player(id) => api.fetch_player(id).await.map(Response::Player),
            Request::Guild(name) => api.fetch_guild(name).await.map(Response::Guild),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::OnlinePlayers => write!(f, "online players"),
            Request::Player(id) => write!(f, "player {}", id),
            Request::Guild(name) => write!(f, "guild {}", name),
        }
    }
}

/// A successful upstream response of any kind
#[derive(Debug, Clone)]
pub enum Response {
    OnlinePlayers(OnlinePlayersResponse),
    Player(PlayerResponse),
    Guild(GuildResponse),
}

impl Response {
    pub fn headers(&self) -> &ResponseHeaders {
        match self {
            Response::OnlinePlayers(resp) => &resp.headers,
            Response::Player(resp) => &resp.headers,
            Response::Guild(resp) => &resp.headers,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Response::OnlinePlayers(_) => RequestKind::OnlinePlayers,
            Response::Player(_) => RequestKind::Player,
            Response::Guild(_) => RequestKind::Guild,
        }
    }
}
