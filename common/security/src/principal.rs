use std::collections::BTreeSet;

use common_auth::{Role, UserId};

use crate::error::{SecurityError, SecurityResult};

/// Authenticated identity plus the authorities granted to it.
///
/// Built once per request by the principal resolver and never mutated
/// afterwards; authority changes only show up on the next resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    id: UserId,
    username: String,
    authorities: BTreeSet<&'static str>,
}

impl AuthenticatedPrincipal {
    /// Build a principal from the user's assigned roles.
    ///
    /// Fails with [`SecurityError::MissingBaseRole`] unless `USER` is among them.
    pub fn from_roles<I>(id: UserId, username: impl Into<String>, roles: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = Role>,
    {
        let authorities: BTreeSet<&'static str> =
            roles.into_iter().map(Role::authority).collect();

        if !authorities.contains(Role::User.authority()) {
            return Err(SecurityError::MissingBaseRole { user_id: id });
        }

        Ok(Self {
            id,
            username: username.into(),
            authorities,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn authorities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.authorities.iter().copied()
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.has_authority(role.authority())
    }
}
