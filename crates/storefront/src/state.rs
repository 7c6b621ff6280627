//! Shared application state.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::quote_api::{QuoteApi, QuoteClient};
use crate::services::auth::SessionManager;
use crate::supabase::{IdentityProvider, SupabaseClient};

/// Long-lived services shared by every view of the storefront.
///
/// Cheaply cloneable via `Arc`. Order workflows are not shared: each upload
/// view creates its own with
/// [`OrderWorkflow::new`](crate::services::order::OrderWorkflow::new).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    quotes: Arc<dyn QuoteApi>,
    sessions: SessionManager,
}

impl AppState {
    /// Build the HTTP clients described by `config`.
    ///
    /// The session manager is created but not started; call
    /// `sessions().start()` once a runtime is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity client cannot be built (for example
    /// an anon key that is not a valid header value).
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let quotes: Arc<dyn QuoteApi> = Arc::new(QuoteClient::new(&config.quote_api));
        let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseClient::new(&config.supabase)?);
        Ok(Self::with_services(config, quotes, identity))
    }

    /// Assemble state from already-built services.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        quotes: Arc<dyn QuoteApi>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let sessions = SessionManager::new(identity, config.auth_callback_url());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                quotes,
                sessions,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the quoting backend client.
    #[must_use]
    pub fn quotes(&self) -> &dyn QuoteApi {
        self.inner.quotes.as_ref()
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }
}
