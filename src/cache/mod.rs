pub mod memory;
pub mod pending;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;
pub use pending::{PendingRegistration, PendingRegistrationStore};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache write failed: {0}")]
    Write(String),

    #[error("cache read failed: {0}")]
    Read(String),

    #[error("cache delete failed: {0}")]
    Delete(String),

    #[error("cache value is malformed: {0}")]
    Malformed(String),
}

/// Key-value cache collaborator.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`; the entry is gone once `ttl` has elapsed.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
