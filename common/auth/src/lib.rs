pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod extractors;
pub mod roles;

pub use claims::{Claims, UserId};
pub use codec::{IssuedToken, TokenCodec};
pub use config::{JwtConfig, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, MIN_SECRET_BYTES};
pub use error::{AuthError, AuthResult};
pub use extractors::{bearer_token, parse_bearer};
pub use roles::{Role, ROLE_PREFIX};
