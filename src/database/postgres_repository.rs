use crate::config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}

impl PostgresRepository {
    /// Opens the pool and brings the schema up to date. Nothing else touches
    /// the store before this succeeds.
    pub async fn connect(db_config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .min_connections(db_config.min_connections)
            .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
            .idle_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&db_config.url)
            .await
            .map_err(ConnectionError::Connect)?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(ConnectionError::Migrate)?;

        tracing::info!("Database pool initialized successfully");
        Ok(Self { pool })
    }
}
