//! Allow-list admission policy.

/// Decides whether a resolved identity gets the admin role.
///
/// Evaluated on every reconciliation, not just record creation, so that
/// allow-list changes take effect on the next login without data migration.
#[derive(Debug, Clone, Default)]
pub struct AdmissionPolicy {
    allow_list: Vec<String>,
}

impl AdmissionPolicy {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self { allow_list }
    }

    /// True if the email, or the username when present, is on the allow-list.
    pub fn is_admin(&self, email: &str, username: Option<&str>) -> bool {
        self.allow_list
            .iter()
            .any(|entry| entry == email || username.is_some_and(|u| entry == u))
    }
}
