//! HTTP implementation of [`StatsApi`] for the Wynncraft v3 API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderName};
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    ApiError, ApiResponse, ApiResult, GuildResponse, OnlinePlayersResponse, PlayerResponse, Quota,
    ResponseHeaders, StatsApi,
};
use crate::config::ApiConfig;

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Longest error body kept in an [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Stats API client
pub struct WynnApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl WynnApi {
    /// Creates a client from configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("kans/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            api_key: config.api_key.clone(),
        })
    }

    /// Builds `{base}/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<ApiResponse<T>> {
        log::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
                quota: has_quota_headers(&response_headers).then(|| parse_quota(&response_headers)),
            });
        }

        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;

        Ok(ApiResponse {
            headers: parse_headers(&response_headers),
            body,
        })
    }
}

#[async_trait]
impl StatsApi for WynnApi {
    async fn fetch_online_roster(&self) -> ApiResult<OnlinePlayersResponse> {
        let mut url = self.endpoint(&["player"])?;
        url.query_pairs_mut().append_pair("identifier", "uuid");
        self.get(url).await
    }

    async fn fetch_player(&self, id_or_name: &str) -> ApiResult<PlayerResponse> {
        let mut url = self.endpoint(&["player", id_or_name])?;
        url.set_query(Some("fullResult"));
        self.get(url).await
    }

    async fn fetch_guild(&self, name_or_prefix: &str) -> ApiResult<GuildResponse> {
        let url = self.endpoint(&["guild", name_or_prefix])?;
        self.get(url).await
    }
}

/// Reads snapshot timestamps and quota from response headers
pub(crate) fn parse_headers(headers: &HeaderMap) -> ResponseHeaders {
    let observed_at = http_date(headers, &header::DATE).unwrap_or_else(Utc::now);
    let expires_at = http_date(headers, &header::EXPIRES).unwrap_or(observed_at);

    ResponseHeaders {
        observed_at,
        expires_at,
        quota: parse_quota(headers),
    }
}

pub(crate) fn parse_quota(headers: &HeaderMap) -> Quota {
    let default = Quota::default();
    Quota {
        remaining: header_number(headers, RATELIMIT_REMAINING).unwrap_or(default.remaining),
        total: header_number(headers, RATELIMIT_LIMIT).unwrap_or(default.total),
        reset_secs: header_number(headers, RATELIMIT_RESET).unwrap_or(default.reset_secs),
    }
}

fn has_quota_headers(headers: &HeaderMap) -> bool {
    headers.contains_key(RATELIMIT_REMAINING) || headers.contains_key(RATELIMIT_RESET)
}

fn http_date(headers: &HeaderMap, name: &HeaderName) -> Option<DateTime<Utc>> {
    let value = headers.get(name)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
