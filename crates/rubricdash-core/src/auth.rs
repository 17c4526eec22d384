//! Authenticated user session.
//!
//! An [`AuthSession`] is built once at start-up (after the backend confirms
//! the token), handed to whatever needs the caller's capability, and consumed
//! by [`AuthSession::logout`]. Nothing looks it up from ambient state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::null_as_default;

/// Role name the backend uses for reviewers allowed to edit.
pub const ADMIN_ROLE: &str = "Admin";

/// What the current caller may do in a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Score, comment and save.
    Admin,
    /// View committed reviews only. Mutations are silently ignored.
    ReadOnly,
}

impl Capability {
    pub fn can_edit(&self) -> bool {
        matches!(self, Capability::Admin)
    }
}

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// The user the backend reports for the current token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(default, alias = "name")]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
}

impl CurrentUser {
    /// Name shown in headers: username, falling back to email.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.email.as_str())
    }
}

/// Token plus the user it belongs to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: BearerToken,
    user: CurrentUser,
    established_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(token: BearerToken, user: CurrentUser) -> Self {
        tracing::debug!(user = %user.display_name(), role = %user.role, "auth session established");
        Self {
            token,
            user,
            established_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Admin users may edit; everyone else is read-only.
    pub fn capability(&self) -> Capability {
        if self.user.role == ADMIN_ROLE {
            Capability::Admin
        } else {
            Capability::ReadOnly
        }
    }

    /// End the session. The token is dropped with it.
    pub fn logout(self) {
        tracing::debug!(user = %self.user.display_name(), "auth session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(role: &str) -> CurrentUser {
        CurrentUser {
            id: "u1".into(),
            email: "prof@example.edu".into(),
            username: None,
            role: role.into(),
        }
    }

    #[test]
    fn admin_role_grants_edit() {
        let session = AuthSession::new(BearerToken::new("t"), user("Admin"));
        assert_eq!(session.capability(), Capability::Admin);
        assert!(session.capability().can_edit());
    }

    #[test]
    fn other_roles_are_read_only() {
        for role in ["Student", "admin", ""] {
            let session = AuthSession::new(BearerToken::new("t"), user(role));
            assert_eq!(session.capability(), Capability::ReadOnly, "role {role:?}");
        }
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = BearerToken::new("  secret-value\n");
        assert_eq!(token.expose(), "secret-value");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut u = user("Admin");
        assert_eq!(u.display_name(), "prof@example.edu");
        u.username = Some("jdoe".into());
        assert_eq!(u.display_name(), "jdoe");
    }

    #[test]
    fn current_user_deserializes_with_name_alias() {
        let u: CurrentUser = serde_json::from_value(json!({
            "_id": "u2",
            "email": "ta@example.edu",
            "name": "Teaching Assistant",
            "role": "Admin"
        }))
        .unwrap();
        assert_eq!(u.display_name(), "Teaching Assistant");
    }

    #[test]
    fn null_user_fields_decode_as_empty() {
        let u: CurrentUser = serde_json::from_value(json!({
            "_id": "u3",
            "email": null,
            "name": null,
            "role": null
        }))
        .unwrap();
        assert_eq!(u.role, "");
        assert_eq!(u.username, None);
    }
}
