//! Supabase identity provider client.
//!
//! # Architecture
//!
//! - GoTrue (`/auth/v1/*`) for accounts and sessions
//! - PostgREST (`/rest/v1/profiles`) for the delivery-address profile
//! - Sessions live in memory only; every change is broadcast as an
//!   [`AuthEvent`] so the session manager can react to sign-ins that
//!   complete elsewhere (OAuth callbacks)
//!
//! # OAuth Flow
//!
//! 1. `authorize_url()` generates a PKCE verifier and returns the provider URL
//! 2. The browser signs in and is redirected to the callback path with a code
//! 3. `exchange_code()` trades the code and stored verifier for a session

mod client;
pub mod oauth;
pub mod types;

pub use client::SupabaseClient;
pub use oauth::OAuthProvider;
pub use types::NewProfile;

use async_trait::async_trait;
use printquote_core::{Email, Profile, ProfileUpdate, UserId};
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

use crate::models::{AuthUser, Session};

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response did not match the expected schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// OAuth flow failed or was cancelled.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Account or row already exists.
    #[error("Already exists: {0}")]
    Conflict(String),
}

impl IdentityError {
    /// Message safe to show next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the sign-in service. Please try again.".to_string(),
            Self::Api { status, .. } if *status >= 500 => {
                "The sign-in service is unavailable. Please try again later.".to_string()
            }
            Self::Api { message, .. } | Self::OAuth(message) | Self::Conflict(message) => {
                message.clone()
            }
            Self::Parse(_) => "Unexpected response from the sign-in service.".to_string(),
        }
    }
}

/// Email and password pair.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a sign-up. `session` is `None` while email confirmation is
/// pending.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session change pushed by the provider.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// The session after the change; `None` once signed out.
    pub session: Option<Session>,
}

/// Identity and profile operations the session manager depends on.
///
/// [`SupabaseClient`] is the production implementation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, refreshing it first if it has expired.
    async fn get_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        full_name: &str,
    ) -> Result<SignUpOutcome, IdentityError>;

    /// Password sign-in.
    async fn sign_in_with_password(&self, credentials: &Credentials)
    -> Result<Session, IdentityError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Start an OAuth sign-in and return the URL to redirect to.
    async fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> Result<Url, IdentityError>;

    /// Finish an OAuth sign-in with the code from the callback.
    async fn exchange_code(&self, auth_code: &str) -> Result<Session, IdentityError>;

    /// Load a profile row. `None` if the user has no profile yet.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, IdentityError>;

    /// Create the profile row, or merge into it if it already exists.
    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), IdentityError>;

    /// Apply a partial update to a profile row.
    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), IdentityError>;

    /// Subscribe to session changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
