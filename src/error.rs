use crate::api::ApiError;
use crate::config::ConfigError;

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Upstream API error: {0}")]
    Api(#[from] ApiError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reporting error: {0}")]
    Reporting(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-friendly name, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Api(_) => "ApiError",
            AppError::Database(_) => "DatabaseError",
            AppError::Config(_) => "ConfigError",
            AppError::Reporting(_) => "ReportingError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

/// Result type alias used across tasks and services
pub type AppResult<T> = Result<T, AppError>;
