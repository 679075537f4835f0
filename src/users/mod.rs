use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo::{PgUserRepository, RepoError, UserRepository};
pub use repo_types::User;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
