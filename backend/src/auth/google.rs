//! Google OAuth2 flows.
//!
//! Two distinct authorization semantics live side by side here and must not
//! be conflated:
//!
//! - the OIDC login flow, which exchanges a code, fetches the userinfo
//!   profile and hands it to the identity reconciler (authentication), and
//! - the Drive/Gmail flow, which exchanges a code for resource-scoped
//!   tokens and returns them as-is, establishing no identity at all
//!   (authorization).

use reqwest::Client;
use serde::Deserialize;

use crate::auth::error::{AuthError, Result};
use crate::config::GoogleConfig;
use crate::models::profile::GoogleProfile;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const LOGIN_SCOPES: &str = "openid email profile";
const DRIVE_SCOPES: &str = "https://www.googleapis.com/auth/drive.readonly \
                            https://www.googleapis.com/auth/gmail.readonly";

/// Token pair returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Client for Google's authorization, token and userinfo endpoints.
pub struct GoogleOAuthClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleConfig) -> Self {
        Self::with_endpoints(config, AUTH_URL, TOKEN_URL, USERINFO_URL)
    }

    /// Endpoint override used by tests to point at a mock server.
    pub fn with_endpoints(
        config: &GoogleConfig,
        auth_url: &str,
        token_url: &str,
        userinfo_url: &str,
    ) -> Self {
        Self {
            http_client: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            auth_url: auth_url.to_string(),
            token_url: token_url.to_string(),
            userinfo_url: userinfo_url.to_string(),
        }
    }

    /// Authorize URL for the OIDC login flow.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(LOGIN_SCOPES),
        )
    }

    /// Authorize URL for the authorization-only Drive/Gmail flow.
    /// Offline access with forced consent, so a refresh token comes back.
    pub fn drive_authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.drive_callback_url()),
            urlencoding::encode(DRIVE_SCOPES),
        )
    }

    /// Redirect URI of the Drive/Gmail flow, derived from the login
    /// callback so only one URL needs configuring.
    pub fn drive_callback_url(&self) -> String {
        self.callback_url
            .replace("/auth/google/callback", "/auth/google-drive/callback")
    }

    /// Exchange an authorization code at the token endpoint.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleTokens> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthFailed(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))
    }

    /// Fetch the verified profile for an access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthFailed(format!("{status}: {body}")));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

        Ok(GoogleProfile {
            provider_id: info.id,
            email: info.email,
            first_name: info.given_name.unwrap_or_default(),
            last_name: info.family_name.unwrap_or_default(),
            picture: info.picture,
        })
    }
}
