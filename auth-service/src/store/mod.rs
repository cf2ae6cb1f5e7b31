use std::collections::BTreeSet;

use async_trait::async_trait;
use common_auth::{Role, UserId};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failures of the user/role store. These are never treated
/// as authentication failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record conflicts with existing data ({0})")]
    Conflict(String),
    #[error("stored record is invalid: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.constraint().unwrap_or("unique").to_string());
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// A stored account together with its role assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserIdentity>>;

    /// Single lookup matching either the username or the email exactly.
    /// A username match wins over an email match.
    async fn find_by_username_or_email(&self, identifier: &str)
        -> StoreResult<Option<UserIdentity>>;

    /// True when `username` is already some account's username or email.
    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;

    /// True when `email` is already some account's email or username.
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    /// Persists the user and its role assignments atomically.
    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserIdentity>;

    async fn list_users(&self) -> StoreResult<Vec<UserIdentity>>;

    /// Returns `false` when no user has the given id.
    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<bool>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn count_roles(&self) -> StoreResult<i64>;

    /// Returns `false` when the role row already existed.
    async fn insert_role(&self, role: Role) -> StoreResult<bool>;

    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
}

/// Everything the service needs from persistence.
pub trait AuthStore: UserStore + RoleStore {}

impl<T> AuthStore for T where T: UserStore + RoleStore {}
