//! Authentication error types.

use thiserror::Error;

use printquote_core::EmailError;

use crate::supabase::IdentityError;

/// Form input rejected before contacting the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Full name is required")]
    FullNameRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Address information is required for delivery")]
    AddressRequired,
}

/// Errors that can occur during session and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Local form validation failed. No request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation needs a signed-in user and there is none.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The initial session fetch has not finished yet.
    #[error("session still loading")]
    Loading,

    /// The identity provider rejected or failed the request.
    #[error("identity provider error: {0}")]
    Provider(#[from] IdentityError),
}

impl AuthError {
    /// Message safe to show next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::Loading => "Loading…".to_string(),
            Self::Provider(e) => e.user_message(),
        }
    }
}
