//! Authentication routes.
//!
//! JSON endpoints for local and LDAP login, browser-redirect endpoints for
//! the two Google flows, and the token-protected profile fetch. Handlers
//! hold no logic beyond request validation and response shaping; the auth
//! core does the work.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::{AuthError, Result};
use crate::auth::token::Session;
use crate::models::profile::ExternalProfile;
use crate::models::user::PublicUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LdapLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LdapRegisterRequest {
    pub username: String,
    pub cn: String,
    pub sn: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LdapRegisterResponse {
    pub message: String,
    pub dn: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters Google sends to either callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// POST /auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = state.local.register(&request.email, &request.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>> {
    let user = state.local.validate(&request.email, &request.password).await?;
    Ok(Json(state.sessions.issue(&user)?))
}

/// POST /auth/ldap
async fn ldap_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LdapLoginRequest>,
) -> Result<Json<Session>> {
    require_min_len("username", &request.username, 3)?;
    require_min_len("password", &request.password, 6)?;

    let profile = state.ldap.validate(&request.username, &request.password).await?;
    let user = state
        .reconciler
        .resolve(&ExternalProfile::Ldap(profile))
        .await?;
    Ok(Json(state.sessions.issue(&user)?))
}

/// POST /auth/ldap/register
async fn ldap_register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LdapRegisterRequest>,
) -> Result<(StatusCode, Json<LdapRegisterResponse>)> {
    require_min_len("username", &request.username, 3)?;
    require_min_len("cn", &request.cn, 3)?;
    require_min_len("sn", &request.sn, 2)?;
    require_min_len("password", &request.password, 6)?;

    let dn = state
        .ldap
        .register(&crate::auth::LdapRegistration {
            username: request.username,
            cn: request.cn,
            sn: request.sn,
            password: request.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LdapRegisterResponse {
            message: "LDAP user registered".to_string(),
            dn,
        }),
    ))
}

/// GET /auth/google
async fn google_auth(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.google.authorize_url())
}

/// GET /auth/google/callback
///
/// Terminates the OIDC login flow: code exchange, profile fetch,
/// reconciliation, session issuance, then a redirect into the frontend
/// portal matching the user's role. Failures redirect with a
/// machine-readable `error` kind instead of a JSON body.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    let frontend = &state.config.frontend.url;

    if query.error.is_some() {
        return error_redirect(frontend, "access_denied", "Google sign-in was cancelled");
    }
    let Some(code) = query.code else {
        return error_redirect(frontend, "oauth_failed", "missing authorization code");
    };

    let session = async {
        let tokens = state
            .google
            .exchange_code(&code, &state.config.google.callback_url)
            .await?;
        let profile = state.google.fetch_profile(&tokens.access_token).await?;
        let user = state
            .reconciler
            .resolve(&ExternalProfile::Google(profile))
            .await?;
        let session = state.sessions.issue(&user)?;
        Ok::<_, AuthError>((session, tokens.access_token))
    }
    .await;

    match session {
        Ok((session, google_access_token)) => {
            let portal = if session.user.is_admin {
                "/admin/about"
            } else {
                "/client/about"
            };
            Redirect::temporary(&format!(
                "{frontend}{portal}?token={}&google_access_token={}&isAdmin={}",
                urlencoding::encode(&session.access_token),
                urlencoding::encode(&google_access_token),
                session.user.is_admin,
            ))
        }
        Err(err) => {
            tracing::warn!("Google OIDC callback failed: {err}");
            let kind = match &err {
                AuthError::DomainNotAllowed(_) => "access_denied",
                AuthError::OAuthFailed(_) => "oauth_failed",
                _ => "server_error",
            };
            error_redirect(frontend, kind, &err.to_string())
        }
    }
}

/// GET /auth/google-drive
async fn google_drive_auth(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.google.drive_authorize_url())
}

/// GET /auth/google-drive/callback
///
/// Terminates the authorization-only flow: the Google tokens are passed
/// through to the frontend untouched. No identity is established, so the
/// reconciler and session issuer are never involved.
async fn google_drive_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    let frontend = &state.config.frontend.url;

    if query.error.is_some() {
        return error_redirect(frontend, "access_denied", "Google authorization was cancelled");
    }
    let Some(code) = query.code else {
        return error_redirect(frontend, "oauth_failed", "missing authorization code");
    };

    match state
        .google
        .exchange_code(&code, &state.google.drive_callback_url())
        .await
    {
        Ok(tokens) => Redirect::temporary(&format!(
            "{frontend}/drive-dashboard?access_token={}&refresh_token={}",
            urlencoding::encode(&tokens.access_token),
            urlencoding::encode(tokens.refresh_token.as_deref().unwrap_or_default()),
        )),
        Err(err) => {
            tracing::warn!("Google Drive callback failed: {err}");
            error_redirect(frontend, "oauth_failed", &err.to_string())
        }
    }
}

/// GET /auth/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>> {
    let claims = state.sessions.authenticate(&headers)?;
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::Unauthenticated("malformed subject claim".to_string()))?;

    let user = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AuthError::Unauthenticated("unknown user".to_string()))?;

    Ok(Json(PublicUser::from(&user)))
}

/// GET /auth/status
async fn status() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Authentication service is ready".to_string(),
    })
}

/// POST /auth/logout
///
/// Sessions are stateless, so there is nothing to revoke server-side; the
/// client discards its token.
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful".to_string(),
    })
}

fn error_redirect(frontend: &str, kind: &str, message: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{frontend}/login?error={kind}&message={}",
        urlencoding::encode(message)
    ))
}

fn require_min_len(field: &str, value: &str, min: usize) -> Result<()> {
    if value.len() < min {
        return Err(AuthError::InvalidRequest(format!(
            "{field} must be at least {min} characters long"
        )));
    }
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/ldap", post(ldap_login))
        .route("/auth/ldap/register", post(ldap_register))
        .route("/auth/google", get(google_auth))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/google-drive", get(google_drive_auth))
        .route("/auth/google-drive/callback", get(google_drive_callback))
        .route("/auth/profile", get(profile))
        .route("/auth/status", get(status))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_len_validation() {
        assert!(require_min_len("username", "jd", 3).is_err());
        assert!(require_min_len("username", "jdoe", 3).is_ok());

        let err = require_min_len("password", "12345", 6).unwrap_err();
        assert!(err.to_string().contains("password"));
        assert!(matches!(err, AuthError::InvalidRequest(_)));
    }
}
