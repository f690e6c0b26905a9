//! LDAP credential validation.
//!
//! The real directory is always tried first; any failure there, whether a
//! connection problem or a bad credential, falls through to the static
//! fallback directory when that is enabled. The failure classification is
//! kept so that the right error surfaces when the fallback misses:
//! connection-class failures report `DirectoryUnavailable`, everything else
//! `InvalidCredentials`.

use std::time::Duration;

use ldap3::{ldap_escape, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};

use crate::auth::error::{AuthError, Result};
use crate::auth::fallback::MockDirectory;
use crate::config::LdapConfig;
use crate::models::profile::LdapProfile;

/// Request shape for provisioning a new directory entry.
#[derive(Debug, Clone)]
pub struct LdapRegistration {
    pub username: String,
    /// Common name, e.g. "Test User".
    pub cn: String,
    /// Surname.
    pub sn: String,
    pub password: String,
}

/// Validates directory credentials, with the fallback chain described above.
pub struct LdapValidator {
    config: LdapConfig,
    fallback: Option<MockDirectory>,
}

impl LdapValidator {
    pub fn new(config: LdapConfig) -> Self {
        let fallback = config
            .allow_fallback
            .then(MockDirectory::with_default_entries);
        Self { config, fallback }
    }

    /// Validate a username/password pair and produce a normalized profile.
    pub async fn validate(&self, username: &str, password: &str) -> Result<LdapProfile> {
        match self.authenticate_real(username, password).await {
            Ok(profile) => Ok(profile),
            Err(err) => {
                tracing::warn!("Real directory authentication failed: {err}");
                match &self.fallback {
                    // A fallback miss surfaces the real directory's failure,
                    // preserving its connection/credential classification.
                    Some(mock) => mock.authenticate(username, password).map_err(|_| err),
                    None => Err(err),
                }
            }
        }
    }

    async fn authenticate_real(&self, username: &str, password: &str) -> Result<LdapProfile> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let settings = LdapConnSettings::new().set_conn_timeout(timeout);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(classify)?;
        ldap3::drive!(conn);

        // Service account bind, then search for the entry to authenticate.
        ldap.with_timeout(timeout)
            .simple_bind(&self.config.bind_dn, &self.config.bind_credentials)
            .await
            .map_err(classify)?
            .success()
            .map_err(classify)?;

        let filter = self
            .config
            .search_filter
            .replace("{{username}}", &ldap_escape(username));
        let (entries, _) = ldap
            .with_timeout(timeout)
            .search(&self.config.search_base, Scope::Subtree, &filter, vec!["*"])
            .await
            .map_err(classify)?
            .success()
            .map_err(classify)?;

        let entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or(AuthError::InvalidCredentials)?;

        // Re-bind as the found entry to verify the supplied password.
        ldap.with_timeout(timeout)
            .simple_bind(&entry.dn, password)
            .await
            .map_err(classify)?
            .success()
            .map_err(|_| AuthError::InvalidCredentials)?;

        let _ = ldap.unbind().await;
        Ok(profile_from_entry(entry, username))
    }

    /// Provision a new directory entry (create-and-bind) with an
    /// SSHA-hashed password.
    pub async fn register(&self, registration: &LdapRegistration) -> Result<String> {
        use std::collections::HashSet;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let settings = LdapConnSettings::new().set_conn_timeout(timeout);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(classify)?;
        ldap3::drive!(conn);

        ldap.with_timeout(timeout)
            .simple_bind(&self.config.bind_dn, &self.config.bind_credentials)
            .await
            .map_err(classify)?
            .success()
            .map_err(classify)?;

        let dn = format!("uid={},{}", registration.username, self.config.search_base);
        let password_hash = ssha_hash(&registration.password);

        let attrs: Vec<(&str, HashSet<&str>)> = vec![
            ("objectClass", HashSet::from(["inetOrgPerson"])),
            ("uid", HashSet::from([registration.username.as_str()])),
            ("cn", HashSet::from([registration.cn.as_str()])),
            ("sn", HashSet::from([registration.sn.as_str()])),
            ("userPassword", HashSet::from([password_hash.as_str()])),
        ];

        ldap.with_timeout(timeout)
            .add(&dn, attrs)
            .await
            .map_err(classify)?
            .success()
            .map_err(|e| AuthError::InvalidRequest(format!("directory add failed: {e}")))?;

        let _ = ldap.unbind().await;
        tracing::info!("Provisioned directory entry {dn}");
        Ok(dn)
    }
}

/// Connection-class failures trigger fallback and surface as
/// `DirectoryUnavailable`; everything else is a credential-class failure.
fn classify(err: LdapError) -> AuthError {
    match err {
        LdapError::Io { .. }
        | LdapError::EndOfStream
        | LdapError::Timeout { .. }
        | LdapError::OpSend { .. }
        | LdapError::ResultRecv { .. } => AuthError::DirectoryUnavailable(err.to_string()),
        _ => AuthError::InvalidCredentials,
    }
}

/// Map directory attributes into the normalized profile shape.
///
/// Every attribute has a defined fallback derivation: email is synthesized
/// from the account name when `mail` is absent, and `cn` is split on
/// whitespace when `givenName`/`sn` are missing.
fn profile_from_entry(entry: SearchEntry, login_username: &str) -> LdapProfile {
    let attr = |name: &str| entry.attrs.get(name).and_then(|v| v.first()).cloned();

    let cn = attr("cn");
    let username = attr("sAMAccountName")
        .or_else(|| attr("uid"))
        .unwrap_or_else(|| login_username.to_string());
    let email = attr("mail")
        .or_else(|| attr("userPrincipalName"))
        .unwrap_or_else(|| format!("{username}@company.com"));
    let first_name = attr("givenName")
        .or_else(|| {
            cn.as_ref()
                .and_then(|c| c.split_whitespace().next().map(String::from))
        })
        .unwrap_or_default();
    let last_name = attr("sn")
        .or_else(|| {
            cn.as_ref()
                .map(|c| c.split_whitespace().skip(1).collect::<Vec<_>>().join(" "))
        })
        .unwrap_or_default();
    let display_name = attr("displayName")
        .or_else(|| cn.clone())
        .unwrap_or_else(|| format!("{first_name} {last_name}").trim().to_string());
    let department = attr("department");
    let title = attr("title");

    LdapProfile {
        provider_id: entry.dn,
        email,
        username,
        first_name,
        last_name,
        display_name,
        department,
        title,
    }
}

/// slappasswd-compatible salted SHA-1 hash for `userPassword`.
fn ssha_hash(password: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use rand::Rng;
    use sha1::{Digest, Sha1};

    let mut salt = [0u8; 4];
    rand::thread_rng().fill(&mut salt);

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);

    let mut digest = hasher.finalize().to_vec();
    digest.extend_from_slice(&salt);
    format!("{{SSHA}}{}", STANDARD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entry(dn: &str, attrs: Vec<(&str, Vec<&str>)>) -> SearchEntry {
        SearchEntry {
            dn: dn.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(k, vs)| (k.to_string(), vs.into_iter().map(String::from).collect()))
                .collect(),
            bin_attrs: HashMap::new(),
        }
    }

    fn unroutable_config(allow_fallback: bool) -> LdapConfig {
        LdapConfig {
            // TEST-NET-1 address, nothing listens there.
            url: "ldap://192.0.2.1:389".to_string(),
            timeout_secs: 1,
            allow_fallback,
            ..LdapConfig::default()
        }
    }

    #[test]
    fn test_profile_maps_active_directory_attributes() {
        let entry = entry(
            "CN=John Doe,OU=Users,DC=company,DC=local",
            vec![
                ("mail", vec!["john.doe@company.local"]),
                ("givenName", vec!["John"]),
                ("sn", vec!["Doe"]),
                ("sAMAccountName", vec!["john.doe"]),
                ("displayName", vec!["John Doe"]),
                ("department", vec!["Engineering"]),
                ("title", vec!["Software Engineer"]),
            ],
        );

        let profile = profile_from_entry(entry, "john.doe");
        assert_eq!(profile.email, "john.doe@company.local");
        assert_eq!(profile.username, "john.doe");
        assert_eq!(profile.first_name, "John");
        assert_eq!(profile.last_name, "Doe");
        assert_eq!(profile.display_name, "John Doe");
        assert_eq!(profile.department.as_deref(), Some("Engineering"));
        assert_eq!(
            profile.provider_id,
            "CN=John Doe,OU=Users,DC=company,DC=local"
        );
    }

    #[test]
    fn test_profile_synthesizes_email_from_account_name() {
        let entry = entry(
            "uid=jdoe,ou=people,dc=example,dc=org",
            vec![("uid", vec!["jdoe"]), ("cn", vec!["Jane Doe"])],
        );

        let profile = profile_from_entry(entry, "jdoe");
        assert_eq!(profile.email, "jdoe@company.com");
    }

    #[test]
    fn test_profile_derives_names_by_splitting_cn() {
        let entry = entry(
            "uid=jvd,ou=people,dc=example,dc=org",
            vec![("uid", vec!["jvd"]), ("cn", vec!["Jan van der Berg"])],
        );

        let profile = profile_from_entry(entry, "jvd");
        assert_eq!(profile.first_name, "Jan");
        assert_eq!(profile.last_name, "van der Berg");
        assert_eq!(profile.display_name, "Jan van der Berg");
    }

    #[test]
    fn test_profile_falls_back_to_login_username() {
        let entry = entry("uid=x,dc=example,dc=org", vec![]);

        let profile = profile_from_entry(entry, "typed.name");
        assert_eq!(profile.username, "typed.name");
        assert_eq!(profile.email, "typed.name@company.com");
    }

    #[test]
    fn test_ssha_hash_shape() {
        let hash = ssha_hash("testpassword");
        assert!(hash.starts_with("{SSHA}"));
        // 20-byte digest + 4-byte salt, base64-encoded.
        assert_eq!(hash.len(), "{SSHA}".len() + 32);
        // Salted: two hashes of the same password differ.
        assert_ne!(hash, ssha_hash("testpassword"));
    }

    #[tokio::test]
    async fn test_unreachable_directory_falls_back_to_mock() {
        let validator = LdapValidator::new(unroutable_config(true));

        let profile = validator.validate("john.doe", "anything").await.unwrap();
        assert_eq!(profile.email, "john.doe@company.local");
        assert_eq!(profile.department.as_deref(), Some("Engineering"));
    }

    #[tokio::test]
    async fn test_unreachable_directory_and_unknown_user_fails() {
        let validator = LdapValidator::new(unroutable_config(true));

        let err = validator.validate("nobody", "anything").await.unwrap_err();
        // Fallback missed, so the real attempt's classification surfaces.
        assert!(matches!(err, AuthError::DirectoryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fallback_disabled_surfaces_directory_unavailable() {
        let validator = LdapValidator::new(unroutable_config(false));

        let err = validator.validate("john.doe", "anything").await.unwrap_err();
        assert!(matches!(err, AuthError::DirectoryUnavailable(_)));
    }
}
