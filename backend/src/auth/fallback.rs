//! Static fallback directory.
//!
//! A small fixed set of profiles that answers LDAP logins when the real
//! directory cannot. Passwords are only checked for non-emptiness here:
//! this is a demo/offline convenience, NOT a security boundary, and it is
//! gated behind the `ldap.allow_fallback` configuration flag.

use crate::auth::error::{AuthError, Result};
use crate::models::profile::LdapProfile;

/// In-process substitute for an unreachable directory server.
pub struct MockDirectory {
    entries: Vec<LdapProfile>,
}

impl MockDirectory {
    /// The built-in demo entries.
    pub fn with_default_entries() -> Self {
        let entry = |username: &str,
                     email: &str,
                     first: &str,
                     last: &str,
                     department: &str,
                     title: &str,
                     dn: &str| LdapProfile {
            provider_id: dn.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            display_name: format!("{first} {last}"),
            department: Some(department.to_string()),
            title: Some(title.to_string()),
        };

        Self {
            entries: vec![
                entry(
                    "figmadev@divami.com",
                    "figmadev@divami.com",
                    "Figma",
                    "Developer",
                    "Development",
                    "Frontend Developer",
                    "CN=Figma Developer,OU=Users,DC=divami,DC=com",
                ),
                entry(
                    "john.doe",
                    "john.doe@company.local",
                    "John",
                    "Doe",
                    "Engineering",
                    "Software Engineer",
                    "CN=John Doe,OU=Users,DC=company,DC=local",
                ),
                entry(
                    "admin",
                    "admin@company.local",
                    "System",
                    "Administrator",
                    "IT",
                    "System Administrator",
                    "CN=System Administrator,OU=Users,DC=company,DC=local",
                ),
                entry(
                    "jane.smith",
                    "jane.smith@divami.com",
                    "Jane",
                    "Smith",
                    "Design",
                    "UI/UX Designer",
                    "CN=Jane Smith,OU=Users,DC=divami,DC=com",
                ),
            ],
        }
    }

    /// Exact match on username or email.
    pub fn lookup(&self, username_or_email: &str) -> Option<&LdapProfile> {
        self.entries
            .iter()
            .find(|e| e.username == username_or_email || e.email == username_or_email)
    }

    /// Authenticate against the fallback set: the entry must exist and the
    /// password must be non-empty.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<LdapProfile> {
        let entry = self
            .lookup(username)
            .ok_or(AuthError::InvalidCredentials)?;

        if password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(
            "Fallback directory authenticated '{}' (degraded mode)",
            username
        );
        Ok(entry.clone())
    }
}
