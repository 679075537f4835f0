//! Resend-backed [`EmailSender`].
//!
//! Owns transport details only: request body, bearer auth, timeout, and the
//! mapping of provider error payloads into [`MailError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{EmailMessage, EmailSender, MailError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, MailError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        let body = SendEmailRequest {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &bytes));
        }

        let sent: SendEmailResponse = serde_json::from_slice(&bytes)
            .map_err(|e| MailError::Decode(e.to_string()))?;
        debug!(email_id = %sent.id, "resend accepted message");
        Ok(sent.id)
    }
}

fn provider_error(status: u16, body: &[u8]) -> MailError {
    let message = match serde_json::from_slice::<ProviderError>(body) {
        Ok(ProviderError {
            name: Some(name),
            message: Some(message),
        }) => format!("{name}: {message}"),
        Ok(ProviderError {
            message: Some(message),
            ..
        }) => message,
        _ => String::from_utf8_lossy(body).trim().to_string(),
    };
    MailError::Provider { status, message }
}
