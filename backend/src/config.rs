//! Configuration for the SSO backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
///
/// All values are fixed for the lifetime of the process; the auth core reads
/// them as plain inputs and never reloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub ldap: LdapConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Session token signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret. Required.
    pub secret: String,
    /// Token lifetime in minutes.
    #[serde(default = "default_jwt_expiry")]
    pub expiry_minutes: i64,
}

/// Google OAuth2 client configuration.
///
/// `allowed_domains` restricts which email domains may establish an identity
/// through the OIDC flow; an empty list means no restriction.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URI registered for the OIDC login flow,
    /// e.g. "http://localhost:4000/auth/google/callback".
    #[serde(default)]
    pub callback_url: String,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

/// Directory server connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct LdapConfig {
    #[serde(default = "default_ldap_url")]
    pub url: String,
    /// Service account DN used for the initial bind.
    #[serde(default = "default_ldap_bind_dn")]
    pub bind_dn: String,
    #[serde(default = "default_ldap_bind_credentials")]
    pub bind_credentials: String,
    #[serde(default = "default_ldap_search_base")]
    pub search_base: String,
    /// Search filter with a `{{username}}` placeholder.
    #[serde(default = "default_ldap_search_filter")]
    pub search_filter: String,
    /// Bound timeout for connect/bind/search, in seconds.
    #[serde(default = "default_ldap_timeout")]
    pub timeout_secs: u64,
    /// Whether the static fallback directory may answer when the real
    /// directory is unreachable. Demo/offline convenience, not a security
    /// boundary; disable in any production posture.
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            url: default_ldap_url(),
            bind_dn: default_ldap_bind_dn(),
            bind_credentials: default_ldap_bind_credentials(),
            search_base: default_ldap_search_base(),
            search_filter: default_ldap_search_filter(),
            timeout_secs: default_ldap_timeout(),
            allow_fallback: default_true(),
        }
    }
}

/// Privileged identities. Entries match either an email or a username.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub allow_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Base URL the OAuth callbacks redirect back to.
    #[serde(default = "default_frontend_url")]
    pub url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            url: default_frontend_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4000
}
fn default_jwt_expiry() -> i64 {
    15
}
fn default_ldap_url() -> String {
    "ldap://mock-dc.company.local:389".to_string()
}
fn default_ldap_bind_dn() -> String {
    "CN=AppService,OU=Service Accounts,DC=company,DC=local".to_string()
}
fn default_ldap_bind_credentials() -> String {
    "MockServicePassword123!".to_string()
}
fn default_ldap_search_base() -> String {
    "OU=Users,DC=company,DC=local".to_string()
}
fn default_ldap_search_filter() -> String {
    "(sAMAccountName={{username}})".to_string()
}
fn default_ldap_timeout() -> u64 {
    5
}
fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (SSO__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("SSO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
