use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};

use super::{
    template::{render, WelcomeTemplate},
    EmailMessage, EmailSender, MailError,
};
use crate::{
    config::MailConfig,
    jobs::{JobHandle, Scheduler},
};

/// Renders and sends the post-signup welcome email.
pub struct WelcomeMailer {
    sender: Arc<dyn EmailSender>,
    from: String,
    subject: String,
}

impl WelcomeMailer {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        from: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            from: from.into(),
            subject: subject.into(),
        }
    }

    pub fn from_config(sender: Arc<dyn EmailSender>, cfg: &MailConfig) -> Self {
        Self::new(sender, cfg.from.clone(), cfg.welcome_subject.clone())
    }

    pub async fn deliver(&self, name: &str, email: &str) -> Result<String, MailError> {
        let html = render(&WelcomeTemplate { name })?;
        let message = EmailMessage {
            from: self.from.clone(),
            to: email.to_string(),
            subject: self.subject.clone(),
            html,
        };
        self.sender.send(&message).await
    }
}

/// Schedules the one-shot welcome email for a freshly created user.
///
/// The job is its own error boundary: render and send failures are logged
/// with the job id and never retried.
pub fn schedule_welcome(
    scheduler: &Scheduler,
    mailer: Arc<WelcomeMailer>,
    fire_at: Instant,
    name: String,
    email: String,
) -> JobHandle {
    scheduler.schedule(fire_at, move |job_id| async move {
        match mailer.deliver(&name, &email).await {
            Ok(email_id) => info!(%job_id, %email, %email_id, "welcome email sent"),
            Err(e) => error!(%job_id, %email, error = %e, "welcome email failed"),
        }
    })
}
