//! Identity reconciliation: maps a validated external profile onto a
//! canonical user record, creating or merging as needed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::admission::AdmissionPolicy;
use crate::auth::directory::{KeyedLocks, UserStore};
use crate::auth::error::{AuthError, Result};
use crate::models::profile::ExternalProfile;
use crate::models::user::User;

/// Find-or-create-and-merge over the user directory.
pub struct IdentityReconciler {
    store: Arc<dyn UserStore>,
    policy: AdmissionPolicy,
    locks: Arc<KeyedLocks>,
    /// Email domains allowed on the OAuth path; empty means unrestricted.
    allowed_domains: Vec<String>,
}

impl IdentityReconciler {
    pub fn new(
        store: Arc<dyn UserStore>,
        policy: AdmissionPolicy,
        locks: Arc<KeyedLocks>,
        allowed_domains: Vec<String>,
    ) -> Self {
        Self {
            store,
            policy,
            locks,
            allowed_domains,
        }
    }

    /// Resolve a profile to a persisted user.
    ///
    /// A single insertion-order scan matches on email, on the
    /// provider/provider-id pair, or (LDAP only) on username; the first
    /// record satisfying any predicate wins. A match refreshes descriptive
    /// fields only; identity keys and the password hash are never rewritten.
    /// The whole sequence runs under the per-email lock so that concurrent
    /// first logins for one identity produce exactly one record.
    pub async fn resolve(&self, profile: &ExternalProfile) -> Result<User> {
        if matches!(profile, ExternalProfile::Google(_)) {
            self.check_domain(profile.email())?;
        }

        let _guard = self.locks.acquire(profile.email()).await;

        let is_admin = self.policy.is_admin(profile.email(), profile.username());
        let existing = self.store.find(&|u| matches(u, profile)).await;

        match existing {
            Some(user) => {
                tracing::debug!("Refreshing user {} from {:?} profile", user.id, profile.provider());
                self.store
                    .update(user.id, &|u| merge(u, profile, is_admin))
                    .await
                    .ok_or_else(|| AuthError::Internal("user vanished during update".to_string()))
            }
            None => {
                let user = new_user(profile, is_admin);
                tracing::info!("Created user {} via {:?}", user.id, profile.provider());
                Ok(self.store.insert(user).await)
            }
        }
    }

    fn check_domain(&self, email: &str) -> Result<()> {
        if self.allowed_domains.is_empty() {
            return Ok(());
        }
        let domain = email.rsplit('@').next().unwrap_or_default();
        if self.allowed_domains.iter().any(|d| d == domain) {
            Ok(())
        } else {
            Err(AuthError::DomainNotAllowed(self.allowed_domains.clone()))
        }
    }
}

fn matches(user: &User, profile: &ExternalProfile) -> bool {
    if user.email == profile.email() {
        return true;
    }
    if user.provider == profile.provider()
        && user.provider_id.as_deref() == Some(profile.provider_id())
    {
        return true;
    }
    // LDAP profiles additionally match on username.
    profile
        .username()
        .is_some_and(|name| user.username.as_deref() == Some(name))
}

/// Overwrite descriptive fields with the incoming profile's values.
fn merge(user: &mut User, profile: &ExternalProfile, is_admin: bool) {
    match profile {
        ExternalProfile::Google(p) => {
            user.first_name = Some(p.first_name.clone());
            user.last_name = Some(p.last_name.clone());
            user.picture = p.picture.clone();
        }
        ExternalProfile::Ldap(p) => {
            user.first_name = Some(p.first_name.clone());
            user.last_name = Some(p.last_name.clone());
            user.display_name = Some(p.display_name.clone());
            user.department = p.department.clone();
            user.title = p.title.clone();
        }
    }
    user.is_admin = is_admin;
}

fn new_user(profile: &ExternalProfile, is_admin: bool) -> User {
    let mut user = User {
        id: Uuid::new_v4(),
        email: profile.email().to_string(),
        password_hash: None,
        provider: profile.provider(),
        provider_id: Some(profile.provider_id().to_string()),
        username: profile.username().map(String::from),
        display_name: None,
        first_name: None,
        last_name: None,
        picture: None,
        department: None,
        title: None,
        is_admin,
        is_active: true,
        created_at: Utc::now(),
    };
    merge(&mut user, profile, is_admin);
    user
}
