//! Two-phase administrator onboarding.
//!
//! `stage` parks a candidate admin in the pending-registration store and mails
//! a verification code. `verify` checks the code and promotes the candidate to
//! a durable company and admin user in one transaction, then evicts the
//! pending record.
//!
//! A pending record accepts a limited number of wrong codes before it is
//! discarded, and a limited number of re-sent codes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn, Span};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::cache::{PendingRegistration, PendingRegistrationStore};
use crate::database::models::{Company, User};
use crate::database::store::{NewAdmin, Storage};
use crate::domain::{DomainError, DomainResult, Entity};
use crate::mail::{verification_body, Mailer, VERIFICATION_SUBJECT};

/// Wrong codes tolerated per issued code before the registration is discarded.
pub const MAX_VERIFY_ATTEMPTS: u32 = 5;

/// Fresh codes that may be requested for one registration.
pub const MAX_CODE_RESENDS: u32 = 5;

#[derive(Debug, Clone)]
pub struct StageRequest {
    pub email: String,
    pub password: String,
    pub company_name: String,
}

/// Result of staging or re-sending. `email_sent == false` means the code
/// could not be dispatched; the registration itself is staged.
#[derive(Debug, Clone, Serialize)]
pub struct StagedRegistration {
    pub key: String,
    pub email_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub company: Company,
    pub user: User,
}

pub struct ProvisioningService {
    storage: Arc<dyn Storage>,
    pending: PendingRegistrationStore,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasher,
    ttl: Duration,
    verifying: Mutex<HashSet<String>>,
    span: Span,
}

/// Marks a key as in flight (verify or resend); released on drop.
struct VerifyClaim<'a> {
    keys: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for VerifyClaim<'_> {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(&self.key);
    }
}

impl ProvisioningService {
    pub fn new(
        storage: Arc<dyn Storage>,
        pending: PendingRegistrationStore,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasher,
        ttl: Duration,
        span: Span,
    ) -> Self {
        Self {
            storage,
            pending,
            mailer,
            hasher,
            ttl,
            verifying: Mutex::new(HashSet::new()),
            span,
        }
    }

    pub async fn stage(&self, request: StageRequest) -> DomainResult<StagedRegistration> {
        let email = normalize_email(&request.email);
        let company_name = request.company_name.trim().to_string();
        if email.is_empty() {
            return Err(DomainError::MissingField("email"));
        }
        if request.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        if company_name.is_empty() {
            return Err(DomainError::MissingField("company_name"));
        }

        let password_hash = self.hasher.hash(&request.password).await.map_err(|e| {
            error!(parent: &self.span, error = %e, "password hashing failed");
            DomainError::Internal
        })?;

        if self.storage.find_user_by_email(&email).await?.is_some() {
            info!(parent: &self.span, email = %email, "registration rejected, email in use");
            return Err(DomainError::EmailAlreadyExists);
        }

        let key = Uuid::new_v4().to_string();
        let code = generate_code();
        let record = PendingRegistration {
            email,
            password_hash,
            company_name,
            code_digest: digest_code(&code),
            attempts: 0,
            resends: 0,
            staged_at: Utc::now(),
        };
        self.pending.stage(&key, &record, self.ttl).await?;
        info!(parent: &self.span, key = %key, email = %record.email, "registration staged");

        let email_sent = self.dispatch_code(&record, &code).await;
        Ok(StagedRegistration { key, email_sent })
    }

    /// Issue a fresh code for a staged registration and restart its TTL.
    ///
    /// Refused with `NotFound` while a verification of the same key is in
    /// flight. A registration whose email became durable meanwhile is
    /// discarded.
    pub async fn resend_code(&self, key: &str) -> DomainResult<StagedRegistration> {
        let _claim = self.claim(key)?;

        let mut record = self.pending.fetch(key).await?;
        if record.resends >= MAX_CODE_RESENDS {
            warn!(parent: &self.span, key = %key, "resend limit reached");
            return Err(DomainError::Unauthorized);
        }
        if self.storage.find_user_by_email(&record.email).await?.is_some() {
            info!(parent: &self.span, key = %key, "discarding registration, email already in use");
            self.pending.evict(key).await?;
            return Err(DomainError::EmailAlreadyExists);
        }

        let code = generate_code();
        record.code_digest = digest_code(&code);
        record.attempts = 0;
        record.resends += 1;
        record.staged_at = Utc::now();
        self.pending.stage(key, &record, self.ttl).await?;

        let email_sent = self.dispatch_code(&record, &code).await;
        Ok(StagedRegistration {
            key: key.to_string(),
            email_sent,
        })
    }

    pub async fn verify(&self, key: &str, code: &str) -> DomainResult<Promotion> {
        let _claim = self.claim(key)?;

        let record = self.pending.fetch(key).await?;
        if !code_matches(code.trim(), &record.code_digest) {
            self.record_failed_attempt(key, record).await?;
            return Err(DomainError::Unauthorized);
        }

        // Fast path only: the unique email constraint decides races.
        if self.storage.find_user_by_email(&record.email).await?.is_some() {
            return Err(DomainError::EmailAlreadyExists);
        }

        let (company, user) = self
            .storage
            .create_company_with_admin(NewAdmin {
                company_name: record.company_name,
                email: record.email,
                password_hash: record.password_hash,
            })
            .await?;

        if let Err(e) = self.pending.evict(key).await {
            // The admin is durable; a replay now fails on the email constraint.
            error!(parent: &self.span, key = %key, error = %e, "failed to evict promoted registration");
        }

        info!(
            parent: &self.span,
            company_id = %company.id,
            user_id = %user.id,
            "registration promoted"
        );
        Ok(Promotion { company, user })
    }

    /// Count a wrong code. The record keeps its original expiry; once the
    /// attempt limit is reached it is evicted.
    async fn record_failed_attempt(
        &self,
        key: &str,
        mut record: PendingRegistration,
    ) -> DomainResult<()> {
        record.attempts += 1;
        match self.remaining_ttl(&record) {
            Some(ttl) if record.attempts < MAX_VERIFY_ATTEMPTS => {
                warn!(parent: &self.span, key = %key, attempts = record.attempts, "verification code mismatch");
                self.pending.stage(key, &record, ttl).await
            }
            _ => {
                warn!(parent: &self.span, key = %key, "verification attempts exhausted, registration discarded");
                self.pending.evict(key).await
            }
        }
    }

    fn remaining_ttl(&self, record: &PendingRegistration) -> Option<Duration> {
        let elapsed = (Utc::now() - record.staged_at).to_std().unwrap_or_default();
        self.ttl.checked_sub(elapsed).filter(|left| !left.is_zero())
    }

    fn claim(&self, key: &str) -> DomainResult<VerifyClaim<'_>> {
        let mut keys = self.verifying.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.to_string()) {
            return Err(DomainError::NotFound(Entity::Registration));
        }
        Ok(VerifyClaim {
            keys: &self.verifying,
            key: key.to_string(),
        })
    }

    async fn dispatch_code(&self, record: &PendingRegistration, code: &str) -> bool {
        let body = verification_body(&record.company_name, code);
        match self
            .mailer
            .send_email(&record.email, VERIFICATION_SUBJECT, &body)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(parent: &self.span, email = %record.email, error = %e, "verification email not sent");
                false
            }
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

fn digest_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

fn code_matches(code: &str, stored_digest: &str) -> bool {
    digest_code(code)
        .as_bytes()
        .ct_eq(stored_digest.as_bytes())
        .into()
}
