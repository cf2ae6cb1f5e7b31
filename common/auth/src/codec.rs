use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::claims::{Claims, ClaimsRepr, UserId};
use crate::config::{JwtConfig, MAX_TTL_SECONDS, MIN_SECRET_BYTES};
use crate::error::{AuthError, AuthResult};

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 access tokens with a single server-held secret.
///
/// The codec holds no mutable state; one instance is shared by every request
/// handler behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        if config.secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::WeakSecret {
                min: MIN_SECRET_BYTES,
                actual: config.secret.len(),
            });
        }

        let ttl = Some(config.ttl_seconds)
            .filter(|seconds| (1..=MAX_TTL_SECONDS).contains(seconds))
            .and_then(Duration::try_seconds)
            .ok_or(AuthError::InvalidTtl {
                max: MAX_TTL_SECONDS,
                actual: config.ttl_seconds,
            })?;

        // Expiry is checked by hand so that `now == exp` is rejected and no leeway applies.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: UserId) -> AuthResult<IssuedToken> {
        self.issue_at(subject, Utc::now())
    }

    /// Sign a token for `subject` as if the current time were `now`.
    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing(format!("expiry overflows the clock from {now}")))?;
        let claims = Claims {
            subject,
            issued_at: now,
            expires_at,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &ClaimsRepr::from(&claims),
            &self.encoding,
        )
        .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// Validate `token` against the signing secret and the supplied clock.
    ///
    /// Checks run in order: structure, signature, expiry. Nothing beyond the
    /// expiry is read from the payload until the first two have passed.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let data = decode::<ClaimsRepr>(token, &self.decoding, &self.validation)?;
        let repr = data.claims;

        if now.timestamp() >= repr.exp {
            return Err(AuthError::Expired);
        }

        let claims = Claims::try_from(repr)?;
        debug!(subject = %claims.subject, "validated access token");
        Ok(claims)
    }
}
