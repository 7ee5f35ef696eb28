//! Webhook report sink.
//!
//! Posts every report as a JSON body to a fixed URL.

use async_trait::async_trait;
use std::time::Duration;

use super::{ReportSink, StatusReport};
use crate::error::{AppError, AppResult};

pub struct WebhookReportSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookReportSink {
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Reporting(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReportSink for WebhookReportSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn publish(&self, report: &StatusReport) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "Request timed out".to_string()
                } else if e.is_connect() {
                    "Connection failed".to_string()
                } else {
                    e.to_string()
                };
                AppError::Reporting(reason)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Reporting(if body.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            format!("HTTP {}: {}", status.as_u16(), body)
        }))
    }
}
