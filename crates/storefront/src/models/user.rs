//! Authenticated user as reported by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use printquote_core::UserId;

/// An identity provider account.
///
/// Separate from [`printquote_core::Profile`]: this is the login identity,
/// the profile is the delivery-address record keyed by the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-issued user ID.
    pub id: UserId,
    /// Email address, absent for some OAuth accounts.
    pub email: Option<String>,
    /// Name captured at sign-up or supplied by the OAuth provider.
    pub full_name: Option<String>,
    /// How the account signs in (`email`, `google`, ...).
    pub provider: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Name to greet the user with, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email.as_deref()?.split('@').next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: UserId::new(uuid::Uuid::nil()),
            email: email.map(str::to_string),
            full_name: full_name.map(str::to_string),
            provider: Some("email".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(
            user(Some("Ada Lovelace"), Some("ada@example.com")).display_name(),
            Some("Ada Lovelace")
        );
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(Some("  "), Some("ada@example.com")).display_name(), Some("ada"));
        assert_eq!(user(None, None).display_name(), None);
    }
}
