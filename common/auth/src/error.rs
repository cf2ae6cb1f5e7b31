use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("signing secret must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },
    #[error("token lifetime must be between 1 and {max} seconds, got {actual}")]
    InvalidTtl { max: i64, actual: i64 },
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
}

impl AuthError {
    /// Short label for the token-time failure kinds, used for metrics and logs.
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            AuthError::Malformed(_) | AuthError::InvalidClaim(_, _) => "malformed",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired => "expired",
            AuthError::MissingAuthorization => "missing",
            AuthError::InvalidAuthorization => "invalid_header",
            AuthError::Signing(_)
            | AuthError::WeakSecret { .. }
            | AuthError::InvalidTtl { .. }
            | AuthError::UnknownRole(_) => "internal",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::BadSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(value.to_string()),
        }
    }
}
