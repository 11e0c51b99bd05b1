pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user id.
    pub sub: Uuid,
    /// Tenant the user belongs to.
    pub company: Uuid,
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl JwtCodec {
    pub fn new(config: &SecurityConfig) -> Result<Self, JwtError> {
        if config.jwt_secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry: Duration::hours(config.jwt_expiry_hours as i64),
        })
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }

    pub fn issue(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            company: user.company_id,
            admin: user.is_admin,
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> SecurityConfig {
        SecurityConfig {
            jwt_secret: secret.to_string(),
            jwt_expiry_hours: 1,
            bcrypt_cost: 4,
            enable_cors: true,
            cors_origins: vec![],
        }
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            position_id: None,
            leader_id: None,
            email: "a@x.com".into(),
            name: None,
            password_hash: String::new(),
            is_admin: true,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let codec = JwtCodec::new(&config("secret")).unwrap();
        let user = user();
        let claims = codec.validate(&codec.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.company, user.company_id);
        assert!(claims.admin);
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let ours = JwtCodec::new(&config("secret")).unwrap();
        let theirs = JwtCodec::new(&config("other")).unwrap();
        let token = theirs.issue(&user()).unwrap();
        assert!(matches!(ours.validate(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(JwtCodec::new(&config("")), Err(JwtError::InvalidSecret)));
    }
}
