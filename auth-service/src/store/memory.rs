use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use common_auth::{Role, UserId};
use tokio::sync::RwLock;

use super::{NewUserRecord, RoleStore, StoreError, StoreResult, UserIdentity, UserStore};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<UserId, UserIdentity>,
    roles: BTreeSet<Role>,
}

impl Inner {
    fn identifier_taken(&self, value: &str) -> bool {
        self.users
            .values()
            .any(|user| user.username == value || user.email == value)
    }
}

/// Process-local store used by tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletes an account; tokens already issued for it stop resolving.
    pub async fn remove_user(&self, id: UserId) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }

    /// Replaces the role assignments of an existing account.
    pub async fn set_roles(&self, id: UserId, roles: impl IntoIterator<Item = Role>) -> bool {
        match self.inner.write().await.users.get_mut(&id) {
            Some(user) => {
                user.roles = roles.into_iter().collect();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserIdentity>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> StoreResult<Option<UserIdentity>> {
        let inner = self.inner.read().await;
        let by_username = inner.users.values().find(|user| user.username == identifier);
        Ok(by_username
            .or_else(|| inner.users.values().find(|user| user.email == identifier))
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.inner.read().await.identifier_taken(username))
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.inner.read().await.identifier_taken(email))
    }

    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserIdentity> {
        let mut inner = self.inner.write().await;
        if inner.identifier_taken(&user.username) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if inner.identifier_taken(&user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }

        inner.next_id += 1;
        let identity = UserIdentity {
            id: UserId(inner.next_id),
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
        };
        inner.users.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserIdentity>> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn grant_role(&self, id: UserId, role: Role) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.roles.insert(role);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn count_roles(&self) -> StoreResult<i64> {
        Ok(self.inner.read().await.roles.len() as i64)
    }

    async fn insert_role(&self, role: Role) -> StoreResult<bool> {
        Ok(self.inner.write().await.roles.insert(role))
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.inner.read().await.roles.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, email: &str) -> NewUserRecord {
        NewUserRecord {
            name: "Jane Doe".into(),
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            roles: BTreeSet::from([Role::User]),
        }
    }

    #[tokio::test]
    async fn lookup_matches_username_or_email() {
        let store = InMemoryStore::new();
        let jane = store.insert_user(record("janed", "jane@x.com")).await.unwrap();

        let by_name = store.find_by_username_or_email("janed").await.unwrap();
        let by_email = store.find_by_username_or_email("jane@x.com").await.unwrap();
        assert_eq!(by_name.as_ref().map(|u| u.id), Some(jane.id));
        assert_eq!(by_email.map(|u| u.id), Some(jane.id));
        assert!(store.find_by_username_or_email("jane").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(record("janed", "jane@x.com")).await.unwrap();

        let err = store
            .insert_user(record("janed", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref c) if c.contains("username")));
        let err = store
            .insert_user(record("other", "jane@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref c) if c.contains("email")));
    }

    #[tokio::test]
    async fn usernames_and_emails_share_one_namespace() {
        let store = InMemoryStore::new();
        store.insert_user(record("jane@x.com", "first@x.com")).await.unwrap();

        assert!(store.exists_by_email("jane@x.com").await.unwrap());
        assert!(store.exists_by_username("first@x.com").await.unwrap());
        let err = store
            .insert_user(record("janed", "jane@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref c) if c.contains("email")));
    }

    #[tokio::test]
    async fn grant_role_and_remove_user() {
        let store = InMemoryStore::new();
        let jane = store.insert_user(record("janed", "jane@x.com")).await.unwrap();

        assert!(store.grant_role(jane.id, Role::Admin).await.unwrap());
        assert!(!store.grant_role(UserId(999), Role::Admin).await.unwrap());
        let roles = store.find_by_id(jane.id).await.unwrap().unwrap().roles;
        assert!(roles.contains(&Role::Admin));

        assert!(store.remove_user(jane.id).await);
        assert!(store.find_by_id(jane.id).await.unwrap().is_none());
    }
}
