use async_trait::async_trait;

use super::{ReportSink, StatusReport};
use crate::error::AppResult;

/// Writes reports to the application log
#[derive(Debug, Default)]
pub struct LogReportSink;

#[async_trait]
impl ReportSink for LogReportSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, report: &StatusReport) -> AppResult<()> {
        log::info!("{}", report);
        Ok(())
    }
}
