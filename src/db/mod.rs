pub mod database;
pub mod repository;
pub mod schema;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::models::EntityBatch;

pub use database::Database;
pub use repository::{Entity, Repository};

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Storage seam used by the insert and report tasks
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Creates every table that does not exist yet
    async fn create_schema(&self) -> AppResult<()>;

    /// Writes a whole batch in a single transaction; returns rows written
    async fn persist(&self, batch: &EntityBatch) -> AppResult<u64>;

    /// Combined size of all tables in bytes
    async fn total_size(&self) -> AppResult<i64>;
}

/// Creates a new database connection pool with the provided configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Database connection pool established (max: {}, min: {})",
        config.max_connections,
        config.min_connections
    );

    Ok(pool)
}

/// Performs a health check on the database connection
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
