//! Normalized identity profiles produced by the credential validators and
//! consumed by the identity reconciler.

use crate::models::user::AuthProvider;

/// Profile returned by Google's userinfo endpoint after a code exchange.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    /// OAuth subject id.
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
}

/// Profile mapped from directory attributes (or a fallback entry).
#[derive(Debug, Clone)]
pub struct LdapProfile {
    /// Distinguished name of the directory entry.
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
}

/// Provider-tagged profile with one common accessor surface.
///
/// Local users never appear here: they are created by registration and
/// validated by hash comparison without going through reconciliation.
#[derive(Debug, Clone)]
pub enum ExternalProfile {
    Google(GoogleProfile),
    Ldap(LdapProfile),
}

impl ExternalProfile {
    pub fn provider(&self) -> AuthProvider {
        match self {
            ExternalProfile::Google(_) => AuthProvider::Google,
            ExternalProfile::Ldap(_) => AuthProvider::Ldap,
        }
    }

    pub fn provider_id(&self) -> &str {
        match self {
            ExternalProfile::Google(p) => &p.provider_id,
            ExternalProfile::Ldap(p) => &p.provider_id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            ExternalProfile::Google(p) => &p.email,
            ExternalProfile::Ldap(p) => &p.email,
        }
    }

    /// Username, for providers that carry one.
    pub fn username(&self) -> Option<&str> {
        match self {
            ExternalProfile::Google(_) => None,
            ExternalProfile::Ldap(p) => Some(&p.username),
        }
    }
}
