use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Prefix prepended to a role name to form its granted authority.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    Moderator,
}

impl Role {
    /// Every role, ordered by its fixed id.
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Moderator];

    /// Stable identifier of the role row in the role store.
    pub const fn id(self) -> i64 {
        match self {
            Role::User => 1,
            Role::Admin => 2,
            Role::Moderator => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
        }
    }

    /// Authority string checked by authorization rules, e.g. `ROLE_ADMIN`.
    pub const fn authority(self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
            Role::Moderator => "ROLE_MODERATOR",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let name = trimmed.strip_prefix(ROLE_PREFIX).unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AuthError::UnknownRole(value.to_string()))
    }
}
