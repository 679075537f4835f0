use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::jobs::Scheduler;
use crate::mail::{EmailSender, ResendClient, WelcomeMailer};
use crate::users::{PgUserRepository, UserRepository};

/// Process-wide collaborators, built once at startup and handed to handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub welcome: Arc<WelcomeMailer>,
    pub scheduler: Scheduler,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = connect(&config.database_url).await?;

        let sender = Arc::new(
            ResendClient::new(&config.mail.resend_api_key, &config.mail.resend_base_url)
                .context("build resend client")?,
        ) as Arc<dyn EmailSender>;

        Ok(Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserRepository::new(db)),
            sender,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        let welcome = Arc::new(WelcomeMailer::from_config(sender, &config.mail));
        Self {
            config,
            users,
            welcome,
            scheduler: Scheduler::new(),
        }
    }
}

async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!(error = %e, "migrations failed; continuing");
    }
    Ok(db)
}
