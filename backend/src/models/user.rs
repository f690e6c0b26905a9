use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider that established an identity.
///
/// Assigned when the record is created and never rewritten afterwards, even
/// when a later login through a different provider matches the same record
/// by email (first provider wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Ldap,
}

/// Canonical user record, created on first successful authentication via any
/// provider and mutated on every subsequent one (descriptive fields only).
#[derive(Debug, Clone)]
pub struct User {
    /// Assigned at creation, immutable.
    pub id: Uuid,
    /// Primary matching key across providers.
    pub email: String,
    /// bcrypt hash; present only for locally registered users.
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    /// OAuth subject id or LDAP distinguished name.
    pub provider_id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub picture: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    /// Computed from the admission allow-list on every reconciliation.
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Sanitized user view returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub provider: AuthProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            picture: user.picture.clone(),
            provider: user.provider,
            department: user.department.clone(),
            title: user.title.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: Some("$2b$12$secret".to_string()),
            provider: AuthProvider::Local,
            provider_id: None,
            username: None,
            display_name: None,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            picture: None,
            department: None,
            title: None,
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_view_never_serializes_password_hash() {
        let user = sample_user();
        let view = PublicUser::from(&user);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("$2b$12$secret"));
    }

    #[test]
    fn test_public_view_uses_camel_case() {
        let user = sample_user();
        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["provider"], "local");
    }
}
