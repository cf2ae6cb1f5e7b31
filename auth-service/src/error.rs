use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use common_security::SecurityError;

/// Handler failure: either an authentication outcome rendered by the
/// unauthorized entry point, or a plain API error.
#[derive(Debug)]
pub enum HandlerError {
    Security(SecurityError),
    Api(ApiError),
}

impl From<SecurityError> for HandlerError {
    fn from(value: SecurityError) -> Self {
        HandlerError::Security(value)
    }
}

impl From<ApiError> for HandlerError {
    fn from(value: ApiError) -> Self {
        HandlerError::Api(value)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Security(err) => err.into_response(),
            HandlerError::Api(err) => err.into_response(),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
