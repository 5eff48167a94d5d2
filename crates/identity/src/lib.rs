//! Identity client for the Talentgate platform
//!
//! This crate talks to the hosted identity provider: sign up, sign in,
//! session restoration and sign out. It keeps the current session in
//! memory, optionally mirrors it to an on-disk cache so a restarted
//! process can restore without re-authenticating, and broadcasts
//! auth-state changes to in-process subscribers.

mod session;

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

pub use session::SessionCache;

/// Error type
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Session cache error: {0}")]
    CacheError(#[from] std::io::Error),

    #[error("Missing session")]
    MissingSession,
}

/// User record as the identity provider returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ProviderUser {
    /// The account role stored in user metadata at sign-up
    /// (`"candidate"` or `"recruiter"`). Interpretation is left to the
    /// caller; this layer only carries the string.
    pub fn user_type(&self) -> Option<&str> {
        self.user_metadata.get("user_type").and_then(|v| v.as_str())
    }
}

/// Session as issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    /// Unix timestamp of expiry. The provider sends a relative
    /// `expires_in` only, so this is stamped at receipt time and kept
    /// through the cache so restoration can check expiry directly.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub user: ProviderUser,
}

/// Refresh this close to expiry rather than exactly at it, so a token
/// is never presented in its final seconds.
const EXPIRY_MARGIN_SECS: i64 = 30;

impl ProviderSession {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    pub fn user_type(&self) -> Option<&str> {
        self.user.user_type()
    }

    /// Fill in `expires_at` from `expires_in` if the provider did not send it.
    fn stamp_expiry(&mut self) {
        if self.expires_at.is_none() {
            self.expires_at = Some(chrono::Utc::now().timestamp() + self.expires_in);
        }
    }

    /// Whether the access token is expired (or within the refresh margin).
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() >= expires_at - EXPIRY_MARGIN_SECS,
            None => false,
        }
    }
}

/// Result of a sign-up request. Depending on provider configuration
/// the account is either usable immediately or parked until the user
/// confirms their email address.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    Session(ProviderSession),
    ConfirmationRequired(ProviderUser),
}

/// Auth state transition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A broadcast auth state transition
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<ProviderSession>,
}

/// Client options
#[derive(Debug, Clone)]
pub struct IdentityOptions {
    /// Mirror the session to the on-disk cache after sign-in / refresh.
    pub persist_session: bool,
    /// Refresh an expired session transparently during restoration.
    pub auto_refresh_token: bool,
    /// On-disk cache location. `None` disables the cache.
    pub cache_path: Option<std::path::PathBuf>,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            auto_refresh_token: true,
            cache_path: None,
        }
    }
}

/// Identity client
#[derive(Clone)]
pub struct IdentityClient {
    url: String,
    key: String,
    http_client: Client,
    options: IdentityOptions,
    current_session: Arc<RwLock<Option<ProviderSession>>>,
    cache: Option<SessionCache>,
    auth_events: broadcast::Sender<AuthChange>,
}

impl IdentityClient {
    /// Create a new identity client
    pub fn new(url: &str, key: &str, http_client: Client, options: IdentityOptions) -> Self {
        let cache = options
            .cache_path
            .as_ref()
            .map(|path| SessionCache::new(path.clone()));
        let (auth_events, _) = broadcast::channel(16);

        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            cache,
            auth_events,
        }
    }

    /// Subscribe to auth state transitions made through this client
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChange> {
        self.auth_events.subscribe()
    }

    /// Register a new account. The role travels in user metadata and is
    /// echoed back on every session for that user.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_type: &str,
    ) -> Result<SignUpOutcome, IdentityError> {
        let url = format!("{}/auth/v1/signup", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "data": {
                "user_type": user_type,
            },
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_auth_failure(status, body));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;

        // Auto-confirm deployments answer with a full session, others
        // with just the pending user record.
        if value.get("access_token").is_some() {
            let mut session: ProviderSession = serde_json::from_value(value)?;
            session.stamp_expiry();
            self.store_session(&session)?;
            self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
            Ok(SignUpOutcome::Session(session))
        } else {
            let user: ProviderUser = serde_json::from_value(value)?;
            debug!("sign_up: confirmation pending for user {}", user.id);
            Ok(SignUpOutcome::ConfirmationRequired(user))
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(map_auth_failure(status, error_text));
        }

        let mut session: ProviderSession = response.json().await?;
        session.stamp_expiry();
        self.store_session(&session)?;
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));

        Ok(session)
    }

    /// The session currently held in memory, without touching the
    /// network or the cache.
    pub fn session(&self) -> Option<ProviderSession> {
        let read_guard = self.current_session.read().unwrap();
        read_guard.clone()
    }

    /// Restore the current session.
    ///
    /// Prefers the in-memory session, falls back to the on-disk cache,
    /// and transparently refreshes an expired token when
    /// `auto_refresh_token` is set. Returns `Ok(None)` when nothing
    /// usable exists; a failed refresh is logged and treated as no
    /// session rather than surfaced as an error.
    pub async fn current_session(&self) -> Result<Option<ProviderSession>, IdentityError> {
        let mut candidate = self.session();

        if candidate.is_none() {
            if let Some(cache) = &self.cache {
                candidate = cache.load();
                if candidate.is_some() {
                    debug!("current_session: adopted session from cache");
                }
            }
        }

        let session = match candidate {
            Some(session) => session,
            None => return Ok(None),
        };

        if !session.is_expired() {
            self.store_session(&session)?;
            return Ok(Some(session));
        }

        if !self.options.auto_refresh_token {
            return Ok(None);
        }

        match self.refresh_with_token(&session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(err) => {
                warn!("current_session: refresh failed: {}", err);
                Ok(None)
            }
        }
    }

    /// Refresh the in-memory session
    pub async fn refresh_session(&self) -> Result<ProviderSession, IdentityError> {
        let session = self.session().ok_or(IdentityError::MissingSession)?;
        self.refresh_with_token(&session.refresh_token).await
    }

    async fn refresh_with_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.url);

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(map_auth_failure(status, error_text));
        }

        let mut session: ProviderSession = response.json().await?;
        session.stamp_expiry();
        self.store_session(&session)?;
        self.emit(AuthChangeEvent::TokenRefreshed, Some(session.clone()));

        Ok(session)
    }

    /// Sign out.
    ///
    /// Local state and the cache are cleared before the revocation
    /// call, so credentials are gone even when the network is not
    /// cooperating; the network error is still reported.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let session = self.session();

        self.clear_session();
        self.emit(AuthChangeEvent::SignedOut, None);

        let session = match session {
            Some(session) => session,
            None => return Ok(()),
        };

        let url = format!("{}/auth/v1/logout", self.url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(IdentityError::ApiError(error_text));
        }

        Ok(())
    }

    fn store_session(&self, session: &ProviderSession) -> Result<(), IdentityError> {
        {
            let mut write_guard = self.current_session.write().unwrap();
            *write_guard = Some(session.clone());
        }

        // `persist_session` gates the disk cache only; the in-memory
        // session is always kept so sign-out can revoke it.
        if self.options.persist_session {
            if let Some(cache) = &self.cache {
                cache.store(session)?;
            }
        }

        Ok(())
    }

    fn clear_session(&self) {
        {
            let mut write_guard = self.current_session.write().unwrap();
            *write_guard = None;
        }

        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn emit(&self, event: AuthChangeEvent, session: Option<ProviderSession>) {
        // No subscribers is fine.
        let _ = self.auth_events.send(AuthChange { event, session });
    }
}

fn map_auth_failure(status: reqwest::StatusCode, body: String) -> IdentityError {
    match status.as_u16() {
        400 | 401 | 422 => IdentityError::AuthenticationError(body),
        _ => IdentityError::ApiError(body),
    }
}
