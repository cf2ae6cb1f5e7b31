use std::sync::Arc;

use common_auth::UserId;
use common_security::{AuthenticatedPrincipal, SecurityError};
use thiserror::Error;

use crate::store::{StoreError, UserIdentity, UserStore};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("user {0} no longer exists")]
    UserNotFound(String),
    #[error("user {0} does not hold the USER role")]
    MissingBaseRole(UserId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads a user and freezes its current authorities into a principal.
///
/// Roles are re-read on every call, so grants and revocations show up on the
/// next request carrying an existing token.
#[derive(Clone)]
pub struct PrincipalResolver {
    store: Arc<dyn UserStore>,
}

impl PrincipalResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_by_id(&self, id: UserId) -> Result<AuthenticatedPrincipal, ResolveError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ResolveError::UserNotFound(id.to_string()))?;
        principal_for(&user)
    }

    pub async fn resolve_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<AuthenticatedPrincipal, ResolveError> {
        let user = self
            .store
            .find_by_username_or_email(identifier)
            .await?
            .ok_or_else(|| ResolveError::UserNotFound(identifier.to_string()))?;
        principal_for(&user)
    }
}

/// Builds the principal for an already loaded identity.
pub fn principal_for(user: &UserIdentity) -> Result<AuthenticatedPrincipal, ResolveError> {
    AuthenticatedPrincipal::from_roles(user.id, user.username.clone(), user.roles.iter().copied())
        .map_err(|err| match err {
            SecurityError::MissingBaseRole { user_id } => ResolveError::MissingBaseRole(user_id),
            other => ResolveError::Store(StoreError::Corrupt(other.to_string())),
        })
}
