pub mod context;
pub mod entry_point;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod policy;
pub mod principal;

pub use context::{CurrentPrincipal, SecurityContext};
pub use entry_point::{BAD_CREDENTIALS_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use error::{SecurityError, SecurityResult};
pub use gate::authorize;
pub use pattern::PathPattern;
pub use policy::{AuthorizationRules, Decision, DenyReason};
pub use principal::AuthenticatedPrincipal;
