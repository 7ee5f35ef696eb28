//! Upstream stats API boundary.
//!
//! Tasks and presence tracking only see the [`StatsApi`] trait and the typed
//! [`Response`] values it produces; [`WynnApi`] is the HTTP implementation.

pub mod client;
pub mod model;
pub mod request;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use client::WynnApi;
pub use model::{Guild, Player, Roster};
pub use request::{Request, RequestKind, Response};

/// Quota metadata reported by the upstream on every response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: u32,
    pub total: u32,
    /// Seconds until the quota window resets
    pub reset_secs: u64,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            remaining: 180,
            total: 180,
            reset_secs: 0,
        }
    }
}

/// Response metadata shared by every endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// When the upstream produced the snapshot
    pub observed_at: DateTime<Utc>,
    /// When the upstream will serve a fresher snapshot
    pub expires_at: DateTime<Utc>,
    pub quota: Quota,
}

/// A typed response body with its metadata
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub headers: ResponseHeaders,
    pub body: T,
}

pub type OnlinePlayersResponse = ApiResponse<Roster>;
pub type PlayerResponse = ApiResponse<Player>;
pub type GuildResponse = ApiResponse<Guild>;

/// Failures of a single upstream call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
        quota: Option<Quota>,
    },

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Quota metadata carried by an error response, if any
    pub fn quota(&self) -> Option<Quota> {
        match self {
            ApiError::Status { quota, .. } => *quota,
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The three upstream operations the poller needs
#[async_trait]
pub trait StatsApi: Send + Sync {
    /// Fetches the list of currently online players
    async fn fetch_online_roster(&self) -> ApiResult<OnlinePlayersResponse>;

    /// Fetches full stats of one player by uuid or username
    async fn fetch_player(&self, id_or_name: &str) -> ApiResult<PlayerResponse>;

    /// Fetches one guild by name
    async fn fetch_guild(&self, name_or_prefix: &str) -> ApiResult<GuildResponse>;
}
