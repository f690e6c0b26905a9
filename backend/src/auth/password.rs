//! Local email/password registration and validation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::admission::AdmissionPolicy;
use crate::auth::directory::{KeyedLocks, UserStore};
use crate::auth::error::{AuthError, Result};
use crate::models::user::{AuthProvider, User};

/// Validates and registers users holding a stored password hash.
pub struct LocalAuthenticator {
    store: Arc<dyn UserStore>,
    policy: AdmissionPolicy,
    locks: Arc<KeyedLocks>,
    cost: u32,
}

impl LocalAuthenticator {
    pub fn new(store: Arc<dyn UserStore>, policy: AdmissionPolicy, locks: Arc<KeyedLocks>) -> Self {
        Self {
            store,
            policy,
            locks,
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lower the bcrypt cost. Test-only; the default cost stays in effect
    /// for every production construction site.
    #[cfg(test)]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Create a new local user.
    ///
    /// The existence check and the insert run under the per-email lock so
    /// two concurrent registrations for the same email cannot both succeed.
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        let _guard = self.locks.acquire(email).await;

        if self.store.find(&|u| u.email == email).await.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let hash = hash_password(password.to_string(), self.cost).await?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: Some(hash),
            provider: AuthProvider::Local,
            provider_id: None,
            username: None,
            display_name: None,
            first_name: None,
            last_name: None,
            picture: None,
            department: None,
            title: None,
            is_admin: self.policy.is_admin(email, None),
            is_active: true,
            created_at: Utc::now(),
        };

        tracing::info!("Registered local user {}", user.id);
        Ok(self.store.insert(user).await)
    }

    /// Validate an email/password pair against the stored hash.
    ///
    /// Unknown user, missing hash and wrong password all map to the same
    /// `InvalidCredentials`. The record is returned unchanged.
    pub async fn validate(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .store
            .find(&|u| u.email == email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .clone()
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password.to_string(), hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

// bcrypt is CPU-bound and deliberately slow; keep it off the reactor.

async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::InMemoryUserStore;

    fn authenticator(allow_list: Vec<String>) -> (LocalAuthenticator, Arc<dyn UserStore>) {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let auth = LocalAuthenticator::new(
            store.clone(),
            AdmissionPolicy::new(allow_list),
            Arc::new(KeyedLocks::new()),
        )
        .with_cost(4);
        (auth, store)
    }

    #[tokio::test]
    async fn test_register_then_validate_round_trip() {
        let (auth, _) = authenticator(vec![]);

        let registered = auth.register("a@x.com", "secret1").await.unwrap();
        assert_eq!(registered.email, "a@x.com");
        assert_eq!(registered.provider, AuthProvider::Local);
        assert!(!registered.is_admin);

        let validated = auth.validate("a@x.com", "secret1").await.unwrap();
        assert_eq!(validated.id, registered.id);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let (auth, _) = authenticator(vec![]);
        auth.register("a@x.com", "secret1").await.unwrap();

        let wrong_password = auth.validate("a@x.com", "nope").await.unwrap_err();
        let unknown_user = auth.validate("ghost@x.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected_first_record_untouched() {
        let (auth, store) = authenticator(vec![]);
        let first = auth.register("a@x.com", "secret1").await.unwrap();

        let err = auth.register("a@x.com", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));

        assert_eq!(store.count().await, 1);
        let kept = store.get(first.id).await.unwrap();
        assert_eq!(kept.password_hash, first.password_hash);
    }

    #[tokio::test]
    async fn test_validate_does_not_mutate_the_record() {
        let (auth, store) = authenticator(vec![]);
        let registered = auth.register("a@x.com", "secret1").await.unwrap();

        auth.validate("a@x.com", "secret1").await.unwrap();
        let after = store.get(registered.id).await.unwrap();
        assert_eq!(after.created_at, registered.created_at);
        assert_eq!(after.password_hash, registered.password_hash);
    }

    #[tokio::test]
    async fn test_allow_listed_email_registers_as_admin() {
        let (auth, _) = authenticator(vec!["boss@x.com".to_string()]);

        let boss = auth.register("boss@x.com", "secret1").await.unwrap();
        assert!(boss.is_admin);

        let user = auth.register("user@x.com", "secret1").await.unwrap();
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_concurrent_registration_creates_one_record() {
        let (auth, store) = authenticator(vec![]);
        let auth = Arc::new(auth);

        let mut handles = vec![];
        for _ in 0..4 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move {
                auth.register("race@x.com", "secret1").await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.count().await, 1);
    }
}
