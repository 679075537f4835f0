use async_trait::async_trait;

pub mod resend;
pub mod template;
pub mod welcome;

pub use resend::ResendClient;
pub use welcome::WelcomeMailer;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("template render failed: {0}")]
    Template(#[from] askama::Error),
    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected message ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

/// A fully rendered message, built right before dispatch and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound transactional email. Returns the provider's message id.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError>;
}
