//! HTTP implementation of [`IdentityProvider`] for Supabase.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use printquote_core::{Profile, ProfileUpdate, UserId};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::{Mutex, RwLock, broadcast};
use url::Url;

use super::oauth::Pkce;
use super::types::{ErrorBody, GoTrueSession, SignUpResponse};
use super::{
    AuthEvent, AuthEventKind, Credentials, IdentityError, IdentityProvider, NewProfile,
    OAuthProvider, SignUpOutcome,
};
use crate::config::SupabaseConfig;
use crate::models::Session;

/// Capacity of the auth event channel. Slow subscribers skip old events.
const EVENT_CAPACITY: usize = 16;

/// Client for Supabase auth and the `profiles` table.
///
/// Cheap to clone; clones share the session and event channel.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
    pending_pkce: Mutex<Option<Pkce>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| IdentityError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                session: RwLock::new(None),
                pending_pkce: Mutex::new(None),
                events,
            }),
        })
    }

    /// The session currently held, without refreshing.
    pub async fn current_session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Bearer token for PostgREST: the user's access token when signed in,
    /// the anon key otherwise.
    async fn bearer(&self) -> String {
        let token = self.inner.session.read().await.as_ref().map_or_else(
            || self.inner.anon_key.expose_secret().to_string(),
            |session| session.access_token.expose_secret().to_string(),
        );
        format!("Bearer {token}")
    }

    async fn store_session(&self, session: Session, kind: AuthEventKind) {
        *self.inner.session.write().await = Some(session.clone());
        self.emit(kind, Some(session));
    }

    async fn clear_session(&self) {
        *self.inner.session.write().await = None;
        self.emit(AuthEventKind::SignedOut, None);
    }

    fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.inner.events.send(AuthEvent { kind, session });
        tracing::debug!(?kind, "Auth state changed");
    }

    /// Map non-success statuses to errors.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = ErrorBody::parse(&text);
        let message = body.message().unwrap_or(text);

        if body.is_conflict() || status == reqwest::StatusCode::CONFLICT {
            return Err(IdentityError::Conflict(message));
        }

        Err(IdentityError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
        let body = Self::check(response).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| IdentityError::Parse(e.to_string()))
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, IdentityError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let raw: GoTrueSession = Self::read_json(response).await?;
        Ok(raw.into_session(Utc::now()))
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Session, IdentityError> {
        self.token_grant(
            "refresh_token",
            json!({ "refresh_token": refresh_token.expose_secret() }),
        )
        .await
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        let Some(session) = self.current_session().await else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                self.store_session(refreshed.clone(), AuthEventKind::TokenRefreshed)
                    .await;
                Ok(Some(refreshed))
            }
            Err(IdentityError::Api { status, message }) if status < 500 => {
                tracing::warn!(status, %message, "Session refresh rejected, signing out");
                self.clear_session().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, credentials, full_name), fields(email = %credentials.email))]
    async fn sign_up(
        &self,
        credentials: &Credentials,
        full_name: &str,
    ) -> Result<SignUpOutcome, IdentityError> {
        let body = json!({
            "email": credentials.email.as_str(),
            "password": credentials.password.expose_secret(),
            "data": { "full_name": full_name },
        });

        let response = self
            .inner
            .client
            .post(self.endpoint("auth/v1/signup"))
            .json(&body)
            .send()
            .await?;

        match Self::read_json::<SignUpResponse>(response).await? {
            SignUpResponse::Session(raw) => {
                let session = raw.into_session(Utc::now());
                self.store_session(session.clone(), AuthEventKind::SignedIn)
                    .await;
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => {
                tracing::info!("Sign-up pending email confirmation");
                Ok(SignUpOutcome {
                    user: user.into(),
                    session: None,
                })
            }
        }
    }

    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, IdentityError> {
        let session = self
            .token_grant(
                "password",
                json!({
                    "email": credentials.email.as_str(),
                    "password": credentials.password.expose_secret(),
                }),
            )
            .await?;

        self.store_session(session.clone(), AuthEventKind::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if self.current_session().await.is_some() {
            let response = self
                .inner
                .client
                .post(self.endpoint("auth/v1/logout"))
                .header("Authorization", self.bearer().await)
                .send()
                .await?;

            let status = response.status();
            // An already-revoked token means the session is gone either way.
            if status != reqwest::StatusCode::UNAUTHORIZED && status != reqwest::StatusCode::NOT_FOUND
            {
                Self::check(response).await?;
            }
        }

        self.clear_session().await;
        Ok(())
    }

    async fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> Result<Url, IdentityError> {
        let pkce = Pkce::generate();

        let mut url = Url::parse(&self.endpoint("auth/v1/authorize"))
            .map_err(|e| IdentityError::OAuth(format!("Invalid authorize URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to.as_str())
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "s256");

        *self.inner.pending_pkce.lock().await = Some(pkce);

        tracing::info!(%provider, "Starting OAuth sign-in");
        Ok(url)
    }

    async fn exchange_code(&self, auth_code: &str) -> Result<Session, IdentityError> {
        let pkce = self
            .inner
            .pending_pkce
            .lock()
            .await
            .take()
            .ok_or_else(|| IdentityError::OAuth("No sign-in in progress".to_string()))?;

        let session = self
            .token_grant(
                "pkce",
                json!({ "auth_code": auth_code, "code_verifier": pkce.verifier }),
            )
            .await?;

        self.store_session(session.clone(), AuthEventKind::SignedIn)
            .await;
        Ok(session)
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, IdentityError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("rest/v1/profiles"))
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".to_string())])
            .header("Authorization", self.bearer().await)
            .send()
            .await?;

        let rows: Vec<Profile> = Self::read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), IdentityError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("rest/v1/profiles"))
            .header("Authorization", self.bearer().await)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), IdentityError> {
        let mut body =
            serde_json::to_value(update).map_err(|e| IdentityError::Parse(e.to_string()))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), json!(Utc::now()));
        }

        let response = self
            .inner
            .client
            .patch(self.endpoint("rest/v1/profiles"))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Authorization", self.bearer().await)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }
}
