//! Helpers shared by unit and integration tests.

use crate::config::{
    AdminConfig, Config, FrontendConfig, GoogleConfig, JwtConfig, LdapConfig, LoggingConfig,
    ServerConfig,
};
use crate::{AppState, GoogleOAuthClient};

/// Config with an unroutable directory address (fallback kicks in) and a
/// fixed signing secret.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            expiry_minutes: 15,
        },
        google: GoogleConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-client-secret".to_string(),
            callback_url: "http://localhost:4000/auth/google/callback".to_string(),
            allowed_domains: vec![],
        },
        ldap: LdapConfig {
            // TEST-NET-1 address, nothing listens there.
            url: "ldap://192.0.2.1:389".to_string(),
            timeout_secs: 1,
            allow_fallback: true,
            ..LdapConfig::default()
        },
        admin: AdminConfig {
            allow_list: vec!["admin".to_string(), "root@example.com".to_string()],
        },
        frontend: FrontendConfig {
            url: "http://localhost:3000".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

pub fn test_state() -> AppState {
    AppState::new(test_config())
}

/// State whose Google client talks to the given base URL instead of the
/// real endpoints. Pair with a wiremock server exposing `/token` and
/// `/userinfo`.
pub fn test_state_with_google(base_url: &str) -> AppState {
    let config = test_config();
    let google = GoogleOAuthClient::with_endpoints(
        &config.google,
        &format!("{base_url}/authorize"),
        &format!("{base_url}/token"),
        &format!("{base_url}/userinfo"),
    );
    AppState::with_google_client(config, google)
}
