//! Unified error handling with Sentry integration.
//!
//! Every operation returns its own error type; [`AppError`] wraps them for a
//! host that wants one type to render and report. Reporting sends
//! service-side failures to Sentry and leaves user mistakes out.

use thiserror::Error;

use crate::config::ConfigError;
use crate::quote_api::QuoteApiError;
use crate::services::auth::AuthError;
use crate::services::order::WorkflowError;
use crate::supabase::IdentityError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Quoting backend operation failed.
    #[error("Quote error: {0}")]
    Quote(#[from] QuoteApiError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order workflow transition rejected.
    #[error("Order error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        Self::Auth(AuthError::Provider(err))
    }
}

impl AppError {
    /// Message to show inline. Never includes internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Quote(e) => e.user_message(),
            Self::Auth(e) => e.user_message(),
            Self::Workflow(WorkflowError::NoQuote) => "Please upload a model first.".to_string(),
            Self::Workflow(WorkflowError::ConfirmationInFlight) => {
                "Your order is already being confirmed.".to_string()
            }
            Self::Workflow(WorkflowError::AlreadyConfirmed) => {
                "This quote has already been ordered.".to_string()
            }
            Self::Config(_) | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Whether the failure happened talking to a remote service.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        match self {
            Self::Quote(e) => e.is_transport_failure(),
            Self::Auth(AuthError::Provider(IdentityError::Http(_) | IdentityError::Api { .. })) => {
                true
            }
            _ => false,
        }
    }

    /// Whether this error points at a fault on our side or a backend's,
    /// rather than at something the user did.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Quote(
                QuoteApiError::Http(_) | QuoteApiError::Parse(_) | QuoteApiError::Io(_),
            )
            | Self::Auth(AuthError::Provider(
                IdentityError::Http(_) | IdentityError::Parse(_),
            ))
            | Self::Config(_)
            | Self::Internal(_) => true,
            Self::Quote(QuoteApiError::Api { status, .. })
            | Self::Auth(AuthError::Provider(IdentityError::Api { status, .. })) => *status >= 500,
            _ => false,
        }
    }

    /// Log the error and capture server errors to Sentry.
    ///
    /// Returns the Sentry event ID when one was captured.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
            Some(event_id)
        } else {
            tracing::info!(error = %self, "Operation rejected");
            None
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Confirming order", Some(&[("quote_id", "q-123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
