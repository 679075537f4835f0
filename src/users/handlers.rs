use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::{
    error::ApiError,
    mail::welcome::schedule_welcome,
    state::AppState,
    users::{
        dto::{CreateUserRequest, StatusBody},
        repo::RepoError,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}

/// Creates the user, schedules the welcome email, and answers without
/// waiting for the email.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<StatusBody>), ApiError> {
    // Resolved before any write so a bad delay can't leave a user without a job.
    let Some(fire_at) = Instant::now().checked_add(state.config.welcome_delay) else {
        error!(delay = ?state.config.welcome_delay, "welcome delay overflows the clock");
        return Err(ApiError::Internal);
    };

    match state.users.find_by_email(&payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict);
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::Internal);
        }
    }

    let user = match state.users.create(&payload.name, &payload.email).await {
        Ok(u) => u,
        Err(RepoError::AlreadyExists) => {
            warn!(email = %payload.email, "lost insert race; email already registered");
            return Err(ApiError::Conflict);
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(ApiError::Internal);
        }
    };

    let job = schedule_welcome(
        &state.scheduler,
        state.welcome.clone(),
        fire_at,
        user.name.clone(),
        user.email.clone(),
    );

    info!(
        user_id = %user.id,
        email = %user.email,
        job_id = %job.id(),
        delay_secs = state.config.welcome_delay.as_secs(),
        "user created; welcome email scheduled"
    );
    Ok((StatusCode::CREATED, Json(StatusBody::ok())))
}
