use std::fmt;

/// Default access token lifetime (24 hours).
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Longest accepted token lifetime (ten years).
pub const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Minimum HMAC secret length accepted for HS256 signing.
pub const MIN_SECRET_BYTES: usize = 32;

/// Runtime configuration for JWT issuance and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// Server-held HMAC secret shared by issuance and validation.
    pub secret: Vec<u8>,
    /// Lifetime of an issued token in seconds.
    pub ttl_seconds: i64,
}

impl JwtConfig {
    /// Construct config with the default 24 hour lifetime.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    /// Adjust the token lifetime.
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}
