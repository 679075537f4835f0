use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::users::dto::StatusBody;

/// Errors that reach the HTTP caller. Anything else is logged and collapsed
/// into `Internal` before it gets here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("User already exists")]
    Conflict,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(StatusBody::error(self.to_string()))).into_response()
    }
}
