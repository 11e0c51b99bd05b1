use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::database::constraint::translate;
use crate::domain::{DomainError, DomainResult};

/// Errors from DatabaseManager setup
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Owns the shared connection pool and runs units of work against it.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
    unit_timeout: Duration,
}

impl DatabaseManager {
    /// Build the pool described by `config`. The connection is established lazily.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Self::validate_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        info!(max_connections = config.max_connections, "created database pool");
        Ok(Self::from_pool(pool, Duration::from_millis(config.statement_timeout_ms)))
    }

    pub fn from_pool(pool: PgPool, unit_timeout: Duration) -> Self {
        Self { pool, unit_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    /// Run `work` inside a single transaction.
    ///
    /// Commits when `work` returns `Ok`. Rolls back when it returns `Err`,
    /// exceeds the configured deadline, panics, or when the caller drops the
    /// returned future; in the last two cases the rollback is issued by the
    /// transaction's destructor.
    pub async fn transaction<T, F>(&self, work: F) -> DomainResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, DomainResult<T>> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(|e| translate(&e))?;

        let outcome = tokio::time::timeout(self.unit_timeout, work(&mut *tx)).await;

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await.map_err(|e| translate(&e))?;
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
            Err(_) => {
                warn!(timeout_ms = self.unit_timeout.as_millis() as u64, "unit of work timed out");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(DomainError::Internal)
            }
        }
    }

    fn validate_url(url: &str) -> Result<(), DatabaseError> {
        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }
}
