use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_MAIL_FROM: &str = "Admin <no-reply@killthemagic.dev>";
pub const DEFAULT_WELCOME_SUBJECT: &str = "Hi!";
pub const DEFAULT_WELCOME_DELAY_SECS: u64 = 5;
/// Upper bound for `WELCOME_DELAY_SECS` (one week).
pub const MAX_WELCOME_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub resend_api_key: String,
    pub resend_base_url: String,
    pub from: String,
    pub welcome_subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub welcome_delay: Duration,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let mail = MailConfig {
            resend_api_key: lookup("RESEND_API_KEY").context("RESEND_API_KEY is not set")?,
            resend_base_url: lookup("RESEND_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RESEND_BASE_URL.into()),
            from: lookup("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.into()),
            welcome_subject: lookup("WELCOME_SUBJECT")
                .unwrap_or_else(|| DEFAULT_WELCOME_SUBJECT.into()),
        };
        let welcome_delay_secs = lookup("WELCOME_DELAY_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_WELCOME_DELAY_SECS);
        anyhow::ensure!(
            welcome_delay_secs <= MAX_WELCOME_DELAY_SECS,
            "WELCOME_DELAY_SECS must be at most {MAX_WELCOME_DELAY_SECS}, got {welcome_delay_secs}"
        );

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            welcome_delay: Duration::from_secs(welcome_delay_secs),
            mail,
        })
    }
}
