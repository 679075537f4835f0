#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use greeter::{
    config::{AppConfig, MailConfig},
    mail::{EmailMessage, EmailSender, MailError},
    users::{RepoError, User, UserRepository},
    AppState,
};
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

/// Store fake with the same uniqueness rule as the `users.email` index.
#[derive(Default)]
pub struct InMemoryUsers {
    pub rows: Mutex<Vec<User>>,
    /// Pretend the lookup never sees existing rows, as when two requests race.
    pub blind_lookup: bool,
}

impl InMemoryUsers {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn find_email(&self, email: &str) -> Option<User> {
        let rows = self.rows.lock().unwrap();
        rows.iter().find(|u| u.email == email).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        if self.blind_lookup {
            return Ok(None);
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, name: &str, email: &str) -> Result<User, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == email) {
            return Err(RepoError::AlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }
}

/// Store fake that is always unavailable.
pub struct UnavailableUsers;

#[async_trait]
impl UserRepository for UnavailableUsers {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _name: &str, _email: &str) -> Result<User, RepoError> {
        Err(RepoError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(Instant, EmailMessage)>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<(Instant, EmailMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), message.clone()));
        if self.fail {
            return Err(MailError::Provider {
                status: 500,
                message: "provider unavailable".into(),
            });
        }
        Ok(format!("email_{}", Uuid::new_v4()))
    }
}

pub fn test_config(welcome_delay: Duration) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        welcome_delay,
        mail: MailConfig {
            resend_api_key: "re_test".into(),
            resend_base_url: "http://unused".into(),
            from: "Admin <no-reply@killthemagic.dev>".into(),
            welcome_subject: "Hi!".into(),
        },
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(
        users: Arc<dyn UserRepository>,
        sender: Arc<dyn EmailSender>,
        welcome_delay: Duration,
    ) -> Self {
        let state = AppState::from_parts(Arc::new(test_config(welcome_delay)), users, sender);
        let app = greeter::build_app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Polls until `sender` has recorded at least `n` attempts or `timeout` passes.
pub async fn wait_for_attempts(sender: &RecordingSender, n: usize, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if sender.attempts().len() >= n {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sender.attempts().len() >= n
}
