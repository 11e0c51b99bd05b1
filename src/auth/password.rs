use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// bcrypt hashing, run off the async executor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let plain = plain.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Malformed hashes verify as `false`.
    pub async fn verify(&self, plain: &str, hash: &str) -> bool {
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("pw").await.unwrap();
        assert_ne!(hash, "pw");
        assert!(hasher.verify("pw", &hash).await);
        assert!(!hasher.verify("other", &hash).await);
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        assert!(!PasswordHasher::new(4).verify("pw", "not-a-hash").await);
    }

    #[tokio::test]
    async fn invalid_cost_fails() {
        assert!(matches!(
            PasswordHasher::new(99).hash("pw").await,
            Err(PasswordError::Hash(_))
        ));
    }
}
