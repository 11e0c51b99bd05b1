//! Staging area for administrator sign-ups that are not yet durable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CacheClient, CacheError};
use crate::database::constraint::translate_cache;
use crate::domain::{DomainError, DomainResult, Entity};

const KEY_PREFIX: &str = "registration:";

/// Candidate admin waiting for email verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub email: String,
    pub password_hash: String,
    pub company_name: String,
    /// Hex SHA-256 of the verification code that was mailed out.
    pub code_digest: String,
    /// Wrong codes submitted against the current code.
    #[serde(default)]
    pub attempts: u32,
    /// Codes issued after the first one.
    #[serde(default)]
    pub resends: u32,
    pub staged_at: DateTime<Utc>,
}

/// Pending registrations keyed by caller-generated opaque keys.
#[derive(Clone)]
pub struct PendingRegistrationStore {
    cache: Arc<dyn CacheClient>,
}

impl PendingRegistrationStore {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self { cache }
    }

    pub async fn stage(
        &self,
        key: &str,
        record: &PendingRegistration,
        ttl: Duration,
    ) -> DomainResult<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| translate_cache(&CacheError::Malformed(e.to_string())))?;
        self.cache
            .set(&Self::cache_key(key), value, ttl)
            .await
            .map_err(|e| translate_cache(&e))
    }

    /// Missing and expired keys both yield `NotFound(Registration)`.
    pub async fn fetch(&self, key: &str) -> DomainResult<PendingRegistration> {
        let raw = self
            .cache
            .get(&Self::cache_key(key))
            .await
            .map_err(|e| translate_cache(&e))?
            .ok_or(DomainError::NotFound(Entity::Registration))?;

        serde_json::from_str(&raw).map_err(|e| translate_cache(&CacheError::Malformed(e.to_string())))
    }

    pub async fn evict(&self, key: &str) -> DomainResult<()> {
        self.cache
            .delete(&Self::cache_key(key))
            .await
            .map_err(|e| translate_cache(&e))
    }

    fn cache_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}
