//! Wire formats for the GoTrue and PostgREST endpoints.

use chrono::{DateTime, Duration, Utc};
use printquote_core::{AddressData, Email, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::models::{AuthUser, Session};

// ─────────────────────────────────────────────────────────────────────────────
// GoTrue
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    /// OAuth providers usually send `name` rather than `full_name`.
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoTrueUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
    #[serde(default)]
    app_metadata: AppMetadata,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email.filter(|email| !email.is_empty()),
            full_name: user.user_metadata.full_name.or(user.user_metadata.name),
            provider: user.app_metadata.provider,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: GoTrueUser,
}

impl GoTrueSession {
    /// Convert into a [`Session`], resolving relative expiry against `now`.
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user.into(),
        }
    }
}

/// `POST /auth/v1/signup` returns a session when email confirmation is
/// disabled and a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

/// Error body shapes used by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    /// GoTrue sends the HTTP status here, PostgREST the SQLSTATE.
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// First human-readable message in the body.
    pub fn message(&self) -> Option<String> {
        [&self.msg, &self.message, &self.error_description, &self.error]
            .into_iter()
            .flatten()
            .find(|message| !message.is_empty())
            .cloned()
    }

    /// Whether the body reports a duplicate account or row.
    pub fn is_conflict(&self) -> bool {
        self.error_code.as_deref() == Some("user_already_exists")
            || self.code.as_ref().and_then(serde_json::Value::as_str) == Some("23505")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgREST
// ─────────────────────────────────────────────────────────────────────────────

/// Profile row written at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub address: Option<AddressData>,
}
