//! In-memory stats API with scripted replies

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use kans::api::{
    ApiError, ApiResult, GuildResponse, OnlinePlayersResponse, PlayerResponse, Quota, Request,
    Response, StatsApi,
};

#[derive(Clone)]
enum Reply {
    Ok(Response),
    Fail { status: u16, quota: Option<Quota> },
}

/// Replies with whatever was scripted for a request; unscripted requests fail with 404
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<Request, Reply>>,
    calls: Mutex<Vec<Request>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, request: Request, response: Response) {
        self.replies
            .lock()
            .unwrap()
            .insert(request, Reply::Ok(response));
    }

    pub fn fail(&self, request: Request, status: u16, quota: Option<Quota>) {
        self.replies
            .lock()
            .unwrap()
            .insert(request, Reply::Fail { status, quota });
    }

    /// Requests received so far, in call order
    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    fn reply(&self, request: Request) -> ApiResult<Response> {
        self.calls.lock().unwrap().push(request.clone());

        let scripted = self.replies.lock().unwrap().get(&request).cloned();
        match scripted {
            Some(Reply::Ok(response)) => Ok(response),
            Some(Reply::Fail { status, quota }) => Err(ApiError::Status {
                status,
                body: "scripted failure".to_string(),
                quota,
            }),
            None => Err(ApiError::Status {
                status: 404,
                body: format!("no reply scripted for {}", request),
                quota: None,
            }),
        }
    }
}

fn mismatch(expected: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        body: format!("scripted reply is not a {} response", expected),
        quota: None,
    }
}

#[async_trait]
impl StatsApi for FakeApi {
    async fn fetch_online_roster(&self) -> ApiResult<OnlinePlayersResponse> {
        match self.reply(Request::OnlinePlayers)? {
            Response::OnlinePlayers(resp) => Ok(resp),
            _ => Err(mismatch("roster")),
        }
    }

    async fn fetch_player(&self, id_or_name: &str) -> ApiResult<PlayerResponse> {
        match self.reply(Request::Player(id_or_name.to_string()))? {
            Response::Player(resp) => Ok(resp),
            _ => Err(mismatch("player")),
        }
    }

    async fn fetch_guild(&self, name_or_prefix: &str) -> ApiResult<GuildResponse> {
        match self.reply(Request::Guild(name_or_prefix.to_string()))? {
            Response::Guild(resp) => Ok(resp),
            _ => Err(mismatch("guild")),
        }
    }
}
