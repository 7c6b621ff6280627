//! Session manager.
//!
//! Owns the process-wide [`SessionSnapshot`] and is the only thing that
//! mutates it. Everything else reads snapshots.
//!
//! # Lifecycle
//!
//! 1. [`SessionManager::new`] starts in the loading state
//! 2. [`SessionManager::start`] subscribes to provider events, performs the
//!    single initial session fetch and clears `loading`
//! 3. Every provider event re-fetches the profile for the event's user, or
//!    clears the user when the session is gone
//! 4. [`SessionManager::shutdown`] stops listening

mod error;
mod validation;

pub use error::{AuthError, ValidationError};
pub use validation::{MIN_PASSWORD_LENGTH, SignUpRequest, ValidSignUp, validate_sign_in};

use std::sync::{Arc, Weak};

use printquote_core::{Profile, ProfileUpdate};
use secrecy::SecretString;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::{AuthUser, Session, SessionSnapshot};
use crate::supabase::{IdentityProvider, NewProfile, OAuthProvider, oauth};

/// Shared handle to the session projection.
///
/// Cheap to clone; all clones see the same snapshot.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    provider: Arc<dyn IdentityProvider>,
    snapshot: RwLock<SessionSnapshot>,
    listener: Mutex<Option<JoinHandle<()>>>,
    /// Held while the projection is being replaced.
    updates: Mutex<()>,
    /// Where OAuth providers send the browser back to.
    oauth_redirect: Url,
}

impl Drop for SessionManagerInner {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

impl SessionManager {
    /// Create a manager in the loading state. Call [`Self::start`] next.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, oauth_redirect: Url) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                provider,
                snapshot: RwLock::new(SessionSnapshot::loading()),
                listener: Mutex::new(None),
                updates: Mutex::new(()),
                oauth_redirect,
            }),
        }
    }

    /// Subscribe to session changes and load the initial session.
    ///
    /// Calling this again while already started does nothing.
    pub async fn start(&self) {
        let mut listener = self.inner.listener.lock().await;
        if listener.is_some() {
            return;
        }

        // Subscribe first so a change during the initial fetch is not lost.
        let events = self.inner.provider.subscribe();
        *listener = Some(tokio::spawn(listen(Arc::downgrade(&self.inner), events)));
        drop(listener);

        let session = match self.inner.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Initial session fetch failed");
                None
            }
        };
        self.adopt(session).await;
    }

    /// Stop reacting to provider events.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.listener.lock().await.take() {
            handle.abort();
            tracing::debug!("Session listener stopped");
        }
    }

    /// Current projection.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.snapshot.read().await.loading
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.inner.snapshot.read().await.user.clone()
    }

    /// Gate for pages that need a signed-in user.
    ///
    /// # Errors
    ///
    /// [`AuthError::Loading`] until the initial fetch completes, then
    /// [`AuthError::NotAuthenticated`] if nobody is signed in.
    pub async fn require_user(&self) -> Result<AuthUser, AuthError> {
        let snapshot = self.inner.snapshot.read().await;
        if snapshot.loading {
            return Err(AuthError::Loading);
        }
        snapshot.user.clone().ok_or(AuthError::NotAuthenticated)
    }

    // =========================================================================
    // Account operations
    // =========================================================================

    /// Register an account and create its profile.
    ///
    /// Profile creation is best-effort: a database trigger may already have
    /// created the row, and any failure is logged without failing sign-up.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the provider's sign-up error.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthUser, AuthError> {
        let valid = request.validate()?;

        let outcome = self
            .inner
            .provider
            .sign_up(&valid.credentials, &valid.full_name)
            .await?;

        let profile = NewProfile {
            id: outcome.user.id,
            email: valid.credentials.email.clone(),
            full_name: Some(valid.full_name),
            address: valid.address,
        };
        if let Err(e) = self.inner.provider.upsert_profile(&profile).await {
            tracing::warn!(user_id = %profile.id, error = %e, "Profile creation failed after sign-up");
        }

        add_breadcrumb("auth", "Signed up", None);
        tracing::info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "User signed up"
        );

        if let Some(session) = outcome.session {
            self.adopt(Some(session)).await;
        }
        Ok(outcome.user)
    }

    /// Password sign-in.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the provider's sign-in error.
    pub async fn sign_in(&self, email: &str, password: SecretString) -> Result<AuthUser, AuthError> {
        let credentials = validate_sign_in(email, password)?;
        let session = self
            .inner
            .provider
            .sign_in_with_password(&credentials)
            .await?;

        add_breadcrumb("auth", "Signed in", Some(&[("method", "password")]));
        let user = session.user.clone();
        self.adopt(Some(session)).await;
        Ok(user)
    }

    /// Sign out. The projection is cleared only once the provider confirms.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the user stays signed in locally.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.provider.sign_out().await?;
        add_breadcrumb("auth", "Signed out", None);
        self.adopt(None).await;
        Ok(())
    }

    /// Start an OAuth sign-in, returning the URL to send the browser to.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn sign_in_with_provider(&self, provider: OAuthProvider) -> Result<Url, AuthError> {
        add_breadcrumb("auth", "OAuth sign-in started", Some(&[("provider", provider.as_str())]));
        Ok(self
            .inner
            .provider
            .authorize_url(provider, &self.inner.oauth_redirect)
            .await?)
    }

    /// Finish an OAuth sign-in from the callback URL the browser landed on.
    ///
    /// # Errors
    ///
    /// Returns [`crate::supabase::IdentityError::OAuth`] (wrapped) if the
    /// callback carries an error or no code, or the provider's exchange error.
    pub async fn complete_oauth(&self, callback: &Url) -> Result<AuthUser, AuthError> {
        let code = oauth::authorization_code(callback)?;
        let session = self.inner.provider.exchange_code(&code).await?;

        add_breadcrumb("auth", "Signed in", Some(&[("method", "oauth")]));
        let user = session.user.clone();
        self.adopt(Some(session)).await;
        Ok(user)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update the signed-in user's profile and refresh the projection.
    ///
    /// If the update succeeds but the refresh fails, the projection keeps
    /// the old profile until the next event.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] without a user (no request is made),
    /// otherwise the provider's update error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError> {
        let user_id = self
            .inner
            .snapshot
            .read()
            .await
            .user
            .as_ref()
            .map(|user| user.id)
            .ok_or(AuthError::NotAuthenticated)?;

        self.inner.provider.update_profile(&user_id, update).await?;
        tracing::info!(%user_id, "Profile updated");

        match self.inner.provider.fetch_profile(&user_id).await {
            Ok(profile) => {
                let mut snapshot = self.inner.snapshot.write().await;
                if snapshot.user.as_ref().is_some_and(|user| user.id == user_id) {
                    snapshot.profile = profile;
                }
            }
            Err(e) => tracing::warn!(%user_id, error = %e, "Profile refresh failed"),
        }
        Ok(())
    }

    /// Fetch the signed-in user's profile. `None` without a user.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn get_profile(&self) -> Result<Option<Profile>, AuthError> {
        let Some(user) = self.user().await else {
            return Ok(None);
        };
        Ok(self.inner.provider.fetch_profile(&user.id).await?)
    }

    /// Replace the projection with `session` and its user's profile.
    async fn adopt(&self, session: Option<Session>) {
        let _guard = self.inner.updates.lock().await;
        apply(&self.inner, session).await;
    }
}

/// Write `session` into the projection. Callers hold `updates`.
async fn apply(inner: &SessionManagerInner, session: Option<Session>) {
    let Some(session) = session else {
        let mut snapshot = inner.snapshot.write().await;
        snapshot.session = None;
        snapshot.user = None;
        snapshot.profile = None;
        snapshot.loading = false;
        clear_sentry_user();
        return;
    };

    let profile = match inner.provider.fetch_profile(session.user_id()).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id = %session.user_id(), error = %e, "Profile fetch failed");
            None
        }
    };

    set_sentry_user(session.user_id(), session.user.email.as_deref());

    let mut snapshot = inner.snapshot.write().await;
    snapshot.session = Some(session.info());
    snapshot.user = Some(session.user);
    snapshot.profile = profile;
    snapshot.loading = false;
}

/// Apply provider events until the manager is dropped or the channel closes.
async fn listen(
    inner: Weak<SessionManagerInner>,
    mut events: tokio::sync::broadcast::Receiver<crate::supabase::AuthEvent>,
) {
    loop {
        match events.recv().await {
            Ok(mut event) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let _guard = inner.updates.lock().await;

                // Only the newest queued event matters; an older one may
                // already have been overtaken by a direct sign-in or sign-out.
                loop {
                    match events.try_recv() {
                        Ok(next) => event = next,
                        Err(TryRecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session listener lagged");
                        }
                        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                    }
                }

                tracing::debug!(kind = ?event.kind, "Session change");
                apply(&inner, event.session).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
