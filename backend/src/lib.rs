pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod routes;
pub mod test_util;

pub use auth::{
    AdmissionPolicy, AuthError, GoogleOAuthClient, IdentityReconciler, InMemoryUserStore,
    KeyedLocks, LdapValidator, LocalAuthenticator, SessionIssuer, UserStore,
};
pub use config::Config;
pub use models::profile::{ExternalProfile, GoogleProfile, LdapProfile};
pub use models::user::{AuthProvider, PublicUser, User};

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Canonical user directory, shared by the local validator and the
    /// reconciler.
    pub store: Arc<dyn UserStore>,
    pub local: LocalAuthenticator,
    pub ldap: LdapValidator,
    pub google: GoogleOAuthClient,
    pub reconciler: IdentityReconciler,
    pub sessions: SessionIssuer,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let google = GoogleOAuthClient::new(&config.google);
        Self::with_google_client(config, google)
    }

    /// Variant taking a pre-built Google client, so tests can point it at a
    /// mock server.
    pub fn with_google_client(config: Config, google: GoogleOAuthClient) -> Self {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let locks = Arc::new(KeyedLocks::new());
        let policy = AdmissionPolicy::new(config.admin.allow_list.clone());

        let local = LocalAuthenticator::new(store.clone(), policy.clone(), locks.clone());
        let ldap = LdapValidator::new(config.ldap.clone());
        let reconciler = IdentityReconciler::new(
            store.clone(),
            policy,
            locks,
            config.google.allowed_domains.clone(),
        );
        let sessions = SessionIssuer::new(&config.jwt.secret, config.jwt.expiry_minutes);

        Self {
            config,
            store,
            local,
            ldap,
            google,
            reconciler,
            sessions,
        }
    }
}
