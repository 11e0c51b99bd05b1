use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Outbound email collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them. Used in development.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if !address.contains('@') {
            return Err(MailError::InvalidRecipient(address.to_string()));
        }
        info!(to = address, subject, body, "outbound email");
        Ok(())
    }
}

pub const VERIFICATION_SUBJECT: &str = "Confirm your company registration";

pub fn verification_body(company_name: &str, code: &str) -> String {
    format!(
        "Your verification code for {company_name} is {code}.\n\
         Enter it to finish creating your administrator account."
    )
}
