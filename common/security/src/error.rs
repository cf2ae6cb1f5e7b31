use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_auth::UserId;
use thiserror::Error;

use crate::entry_point;

pub type SecurityResult<T> = Result<T, SecurityError>;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("full authentication is required to access this resource")]
    Unauthorized,
    #[error("invalid username or password")]
    BadCredentials,
    #[error("user {user_id} does not hold the USER role")]
    MissingBaseRole { user_id: UserId },
    #[error("invalid path pattern '{0}'")]
    InvalidPattern(String),
}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        match self {
            SecurityError::Unauthorized | SecurityError::MissingBaseRole { .. } => {
                entry_point::unauthorized()
            }
            SecurityError::BadCredentials => entry_point::bad_credentials(),
            SecurityError::InvalidPattern(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal security error").into_response()
            }
        }
    }
}
