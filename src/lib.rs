//! User signup service that sends a delayed welcome email.

pub mod app;
pub mod config;
pub mod error;
pub mod jobs;
pub mod mail;
pub mod state;
pub mod users;

pub use app::build_app;
pub use state::AppState;
