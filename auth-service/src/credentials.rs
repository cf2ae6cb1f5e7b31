use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use rand_core::OsRng;
use thiserror::Error;

use crate::store::{StoreError, UserIdentity, UserStore};

/// Hash verified when the identifier matches nobody, so an unknown user costs
/// about as much as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("dummy-password-for-timing").ok());

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no user matches the identifier")]
    UserNotFound,
    #[error("password does not match")]
    BadCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CredentialError {
    /// Label used in logs and the login counter.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialError::UserNotFound => "user_not_found",
            CredentialError::BadCredentials => "bad_credentials",
            CredentialError::Store(_) => "store_error",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct HashError(String);

/// Hashes a password with Argon2 and a fresh random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashError(err.to_string()))
}

/// Checks an identifier (username or email) and plaintext password against the store.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn UserStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn verify(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<UserIdentity, CredentialError> {
        let Some(user) = self.store.find_by_username_or_email(identifier).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = password_matches(dummy, password);
            }
            return Err(CredentialError::UserNotFound);
        };

        let parsed = PasswordHash::new(&user.password_hash).map_err(|err| {
            StoreError::Corrupt(format!("password hash of user {}: {err}", user.id))
        })?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(CredentialError::BadCredentials);
        }

        Ok(user)
    }
}

fn password_matches(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, NewUserRecord};
    use common_auth::Role;
    use std::collections::BTreeSet;

    async fn verifier_with_jane() -> (CredentialVerifier, UserIdentity) {
        let store = Arc::new(InMemoryStore::new());
        let jane = store
            .insert_user(NewUserRecord {
                name: "Jane Doe".into(),
                username: "janed".into(),
                email: "jane@x.com".into(),
                password_hash: hash_password("secret1").unwrap(),
                roles: BTreeSet::from([Role::User]),
            })
            .await
            .unwrap();
        (CredentialVerifier::new(store), jane)
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(password_matches(&first, "secret1"));
        assert!(!password_matches(&first, "secret2"));
    }

    #[tokio::test]
    async fn accepts_username_or_email() {
        let (verifier, jane) = verifier_with_jane().await;
        assert_eq!(verifier.verify("janed", "secret1").await.unwrap().id, jane.id);
        assert_eq!(
            verifier.verify("jane@x.com", "secret1").await.unwrap().id,
            jane.id
        );
    }

    #[tokio::test]
    async fn distinguishes_failure_kinds_internally() {
        let (verifier, _) = verifier_with_jane().await;
        assert!(matches!(
            verifier.verify("janed", "wrong-pass").await,
            Err(CredentialError::BadCredentials)
        ));
        assert!(matches!(
            verifier.verify("nobody", "secret1").await,
            Err(CredentialError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn unparseable_stored_hash_is_a_store_error() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_user(NewUserRecord {
                name: "Plain Text".into(),
                username: "plain".into(),
                email: "plain@x.com".into(),
                password_hash: "secret1".into(),
                roles: BTreeSet::from([Role::User]),
            })
            .await
            .unwrap();
        let verifier = CredentialVerifier::new(store);
        assert!(matches!(
            verifier.verify("plain", "secret1").await,
            Err(CredentialError::Store(StoreError::Corrupt(_)))
        ));
    }
}
