use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::SecurityError;
use crate::principal::AuthenticatedPrincipal;

/// Per-request security state, carried in the request extensions.
///
/// Holds at most one principal; an empty context means the request is anonymous.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Arc<AuthenticatedPrincipal>>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: AuthenticatedPrincipal) -> Self {
        Self {
            principal: Some(Arc::new(principal)),
        }
    }

    pub fn principal(&self) -> Option<&AuthenticatedPrincipal> {
        self.principal.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Handler argument yielding the authenticated principal of the request.
///
/// Rejects through the unauthorized entry point when the context is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Arc<AuthenticatedPrincipal>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = SecurityError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(|context| context.principal.clone())
            .map(CurrentPrincipal)
            .ok_or(SecurityError::Unauthorized)
    }
}
