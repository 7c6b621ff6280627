//! Session types.
//!
//! [`Session`] carries the provider's tokens and never leaves the identity
//! layer's control; [`SessionSnapshot`] is the read-only projection every
//! other component sees.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use printquote_core::{Profile, UserId};

use super::user::AuthUser;

/// Tokens issued by the identity provider for a signed-in user.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// The non-secret part of the session.
    #[must_use]
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user_id: self.user.id.clone(),
            email: self.user.email.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Read-only view of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: UserId,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Everything the rest of the application may know about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<SessionInfo>,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    /// True until the initial session fetch has completed.
    pub loading: bool,
}

impl SessionSnapshot {
    /// State before the initial fetch.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            loading: true,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            access_token: SecretString::from("access-token-value"),
            refresh_token: SecretString::from("refresh-token-value"),
            expires_at,
            user: AuthUser {
                id: UserId::new(uuid::Uuid::nil()),
                email: Some("maker@example.com".to_string()),
                full_name: None,
                provider: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session(None));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("access-token-value"));
        assert!(!debug.contains("refresh-token-value"));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(session(Some(now - Duration::seconds(1))).is_expired(now));
        assert!(!session(Some(now + Duration::hours(1))).is_expired(now));
        assert!(!session(None).is_expired(now));
    }

    #[test]
    fn test_snapshot_starts_loading() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn test_info_projection() {
        let info = session(None).info();
        assert_eq!(info.email.as_deref(), Some("maker@example.com"));
    }
}
