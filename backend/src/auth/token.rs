//! Session token issuance and verification.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::error::{AuthError, Result};
use crate::models::user::{PublicUser, User};

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iat: u64,
    pub exp: u64,
}

/// A signed session token together with the sanitized user view.
#[derive(Debug, Serialize)]
pub struct Session {
    pub access_token: String,
    pub user: PublicUser,
}

/// Stateless HS256 signer/verifier. The key is process-wide configuration,
/// loaded once at startup.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::minutes(expiry_minutes),
        }
    }

    /// Sign a short-lived token for a resolved user.
    pub fn issue(&self, user: &User) -> Result<Session> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            iat: now.timestamp() as u64,
            exp: (now + self.expiry).timestamp() as u64,
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Session {
            access_token,
            user: PublicUser::from(user),
        })
    }

    /// Decode and validate a token (signature and expiry).
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))
    }

    /// Extract and verify the bearer token from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims> {
        let header = headers
            .get("authorization")
            .ok_or_else(|| AuthError::Unauthenticated("missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| AuthError::Unauthenticated("invalid Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AuthError::Unauthenticated("Authorization header is not a bearer token".to_string())
        })?;

        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::AuthProvider;
    use uuid::Uuid;

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: Some("$2b$12$hash".to_string()),
            provider: AuthProvider::Local,
            provider_id: None,
            username: None,
            display_name: None,
            first_name: None,
            last_name: None,
            picture: None,
            department: None,
            title: None,
            is_admin,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_round_trips() {
        let issuer = SessionIssuer::new("test-secret", 15);
        let user = user(false);

        let session = issuer.issue(&user).unwrap();
        let claims = issuer.verify(&session.access_token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_admin_flag_is_carried_in_claims() {
        let issuer = SessionIssuer::new("test-secret", 15);

        let admin_session = issuer.issue(&user(true)).unwrap();
        assert!(issuer.verify(&admin_session.access_token).unwrap().is_admin);

        let plain_session = issuer.issue(&user(false)).unwrap();
        assert!(!issuer.verify(&plain_session.access_token).unwrap().is_admin);
    }

    #[test]
    fn test_session_json_never_leaks_password_hash() {
        let issuer = SessionIssuer::new("test-secret", 15);
        let session = issuer.issue(&user(true)).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("$2b$12$hash"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = SessionIssuer::new("test-secret", 15);
        let other = SessionIssuer::new("other-secret", 15);

        let session = issuer.issue(&user(false)).unwrap();
        let err = other.verify(&session.access_token).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Negative lifetime puts exp in the past.
        let issuer = SessionIssuer::new("test-secret", -5);
        let session = issuer.issue(&user(false)).unwrap();

        let err = issuer.verify(&session.access_token).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));
    }

    #[test]
    fn test_authenticate_rejects_missing_and_malformed_headers() {
        let issuer = SessionIssuer::new("test-secret", 15);

        let empty = HeaderMap::new();
        assert!(issuer.authenticate(&empty).is_err());

        let mut basic = HeaderMap::new();
        basic.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(issuer.authenticate(&basic).is_err());
    }

    #[test]
    fn test_authenticate_accepts_bearer_header() {
        let issuer = SessionIssuer::new("test-secret", 15);
        let session = issuer.issue(&user(false)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", session.access_token).parse().unwrap(),
        );
        let claims = issuer.authenticate(&headers).unwrap();
        assert_eq!(claims.email, "a@x.com");
    }
}
