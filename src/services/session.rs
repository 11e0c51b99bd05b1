use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn, Span};

use crate::auth::password::PasswordHasher;
use crate::auth::{Claims, JwtCodec};
use crate::database::models::User;
use crate::database::store::Storage;
use crate::domain::{DomainError, DomainResult};
use crate::services::provisioning::normalize_email;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Password sign-in and bearer token validation.
pub struct SessionService {
    storage: Arc<dyn Storage>,
    hasher: PasswordHasher,
    jwt: JwtCodec,
    span: Span,
}

impl SessionService {
    pub fn new(storage: Arc<dyn Storage>, hasher: PasswordHasher, jwt: JwtCodec, span: Span) -> Self {
        Self {
            storage,
            hasher,
            jwt,
            span,
        }
    }

    /// Every failure is reported as `Unauthorized`, whatever the cause.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<Session> {
        let email = normalize_email(email);
        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            info!(parent: &self.span, "login rejected, unknown email");
            return Err(DomainError::Unauthorized);
        };
        if !user.can_sign_in() || !self.hasher.verify(password, &user.password_hash).await {
            info!(parent: &self.span, user_id = %user.id, "login rejected");
            return Err(DomainError::Unauthorized);
        }

        let token = self.jwt.issue(&user).map_err(|e| {
            error!(parent: &self.span, error = %e, "token issue failed");
            DomainError::Internal
        })?;
        info!(parent: &self.span, user_id = %user.id, "login succeeded");
        Ok(Session {
            token,
            expires_in: self.jwt.expires_in_secs(),
            user,
        })
    }

    pub fn validate(&self, token: &str) -> DomainResult<Claims> {
        self.jwt.validate(token).map_err(|e| {
            warn!(parent: &self.span, error = %e, "token rejected");
            DomainError::Unauthorized
        })
    }
}
