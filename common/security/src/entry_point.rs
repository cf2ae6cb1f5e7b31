//! Fixed-shape 401 responses.
//!
//! Every denial from the authorization gate goes through [`unauthorized`], so
//! a client cannot tell a missing token from an expired one or from a missing
//! role. Login failures use [`bad_credentials`], which is likewise identical
//! for unknown users and wrong passwords.

use axum::http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const UNAUTHORIZED_MESSAGE: &str = "Sorry, you're not authorized to access this resource.";
pub const BAD_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

pub fn unauthorized() -> Response {
    plain_unauthorized(UNAUTHORIZED_MESSAGE)
}

pub fn bad_credentials() -> Response {
    plain_unauthorized(BAD_CREDENTIALS_MESSAGE)
}

fn plain_unauthorized(message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
        message,
    )
        .into_response()
}
