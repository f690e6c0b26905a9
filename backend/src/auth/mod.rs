//! Credential normalization and session issuance.
//!
//! Request flow for every provider: validator → reconciler → admission →
//! issuer, strictly in that order. Validators surface typed failures; the
//! reconciler and issuer propagate them unchanged.

pub mod admission;
pub mod directory;
pub mod error;
pub mod fallback;
pub mod google;
pub mod ldap;
pub mod password;
pub mod reconciler;
pub mod token;

pub use admission::AdmissionPolicy;
pub use directory::{InMemoryUserStore, KeyedLocks, UserStore};
pub use error::AuthError;
pub use fallback::MockDirectory;
pub use google::{GoogleOAuthClient, GoogleTokens};
pub use ldap::{LdapRegistration, LdapValidator};
pub use password::LocalAuthenticator;
pub use reconciler::IdentityReconciler;
pub use token::{Claims, Session, SessionIssuer};
