//! Sign-up, sign-in, sign-out and session restoration.
//!
//! [`AuthCore`] is the coordinator behind the whole crate: it owns the
//! [`AuthStore`], pushes access tokens into the API layer, keeps the store
//! in step with provider-side session changes and triggers the
//! subscription fetch whenever the owning user changes. Flow methods
//! return explicit continuations (routes, sign-in summaries) computed from
//! the state they just produced, never from state captured earlier.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::routes::{landing_route, Route};
use crate::services::Services;
use crate::store::{
    AuthStore, Notice, Session, SessionApplied, StoreEvent, StoreSnapshot, SubscriptionStatus,
    UserRole,
};
use talentgate_identity::{AuthChange, ProviderSession};

/// Everything a client learns from a completed sign-in.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub session: Session,
    pub role: Option<UserRole>,
    /// Status resolved during sign-in; `None` when the fetch failed.
    pub subscription: Option<SubscriptionStatus>,
    /// Where to take the user, computed from the values above.
    pub redirect: Route,
}

/// Coordinates the identity provider, the backend API and the store.
#[derive(Clone)]
pub struct AuthCore {
    pub(crate) services: Services,
    store: AuthStore,
    options: ClientOptions,
    listener_started: Arc<AtomicBool>,
}

impl AuthCore {
    pub fn new(services: Services, options: ClientOptions) -> AuthCore {
        AuthCore {
            services,
            store: AuthStore::new(),
            options,
            listener_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The store backing this core.
    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Subscribes to store change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub(crate) fn require_user_id(&self) -> Result<String, Error> {
        self.store
            .snapshot()
            .session
            .map(|session| session.user_id)
            .ok_or(Error::MissingSession)
    }

    /// Restores a previously persisted session and resolves dependent
    /// state. The returned snapshot is fully settled: `restoring_session`
    /// is cleared and, when a session was recovered, the subscription
    /// fetch has completed (successfully or not).
    ///
    /// Also starts the listener that follows provider-side session
    /// changes (token refreshes, sign-outs) for the life of the core.
    pub async fn restore_session(&self) -> StoreSnapshot {
        self.spawn_change_listener();
        let restored = match self.services.identity.restore().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session restoration failed: {}", e);
                None
            }
        };
        let applied = self.apply_provider_session(restored.as_ref());
        self.store.mark_restored();
        if applied.needs_fetch {
            self.resolve_subscription(applied.epoch).await;
        }
        self.store.snapshot()
    }

    /// Creates an account with the given role recorded in the provider's
    /// user metadata. On success the user is directed to the login page;
    /// providers configured for auto-confirmation may additionally emit a
    /// signed-in session, which the change listener picks up as usual.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Route, Error> {
        self.spawn_change_listener();
        match self.services.identity.sign_up(email, password, role.as_str()).await {
            Ok(_) => {
                self.store.notify(Notice::success(
                    "Account created successfully! You can now sign in.",
                ));
                Ok(Route::Login)
            }
            Err(e) => {
                self.store.notify(Notice::error(e.to_string()));
                Err(Error::Identity(e))
            }
        }
    }

    /// Signs in with email and password. The returned [`SignIn`] carries
    /// the freshly resolved subscription and the landing route computed
    /// from it, so callers never have to consult possibly stale state to
    /// decide where to go next.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, Error> {
        self.spawn_change_listener();
        debug!("Signing in {}", email);
        let provider = match self.services.identity.sign_in(email, password).await {
            Ok(provider) => provider,
            Err(e) => {
                self.store.notify(Notice::error(e.to_string()));
                return Err(Error::Identity(e));
            }
        };

        let (session, role) = Self::domain_session(&provider);
        let applied = self.apply_provider_session(Some(&provider));
        self.resolve_subscription(applied.epoch).await;

        let snapshot = self.store.snapshot();
        self.store.notify(Notice::success("Signed in successfully!"));
        let subscription = snapshot.subscription;
        let redirect = landing_route(role, subscription.as_ref().map(|status| status.tier));
        Ok(SignIn {
            session,
            role,
            subscription,
            redirect,
        })
    }

    /// Signs out. Never fails: the activity entry and the provider-side
    /// revocation are best-effort, local state is cleared regardless, and
    /// the caller is always directed home.
    pub async fn sign_out(&self) -> Route {
        if let Some(session) = self.store.snapshot().session {
            debug!("Signing out user {}", session.user_id);
            if let Err(e) = self.services.activity.log("signed_out", "User signed out").await {
                warn!("Failed to log sign-out activity: {}", e);
            }
        }

        self.apply_provider_session(None);

        if let Err(e) = self.services.identity.sign_out().await {
            warn!("Identity sign-out did not complete cleanly: {}", e);
        }

        self.store.notify(Notice::success("Signed out successfully"));
        Route::Home
    }

    /// Follows provider-side session changes. Idempotent; only the first
    /// call spawns the listener task.
    fn spawn_change_listener(&self) {
        if self.listener_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let core = self.clone();
        let mut changes = self.services.identity.changes();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => core.handle_auth_change(change).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Auth change listener lagged; skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn handle_auth_change(&self, change: AuthChange) {
        debug!("Auth state change: {:?}", change.event);
        let applied = self.apply_provider_session(change.session.as_ref());
        if applied.needs_fetch {
            self.resolve_subscription(applied.epoch).await;
        }
    }

    /// Applies a provider session to the store and keeps the API bearer
    /// in step with it.
    pub(crate) fn apply_provider_session(
        &self,
        provider: Option<&ProviderSession>,
    ) -> SessionApplied {
        let (session, role) = match provider {
            Some(provider) => {
                let (session, role) = Self::domain_session(provider);
                (Some(session), role)
            }
            None => (None, None),
        };
        self.services
            .token_sink
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        self.store.apply_session(session, role)
    }

    fn domain_session(provider: &ProviderSession) -> (Session, Option<UserRole>) {
        let session = Session {
            user_id: provider.user_id().to_string(),
            email: provider.email().map(|email| email.to_string()),
            access_token: provider.access_token.clone(),
            refresh_token: provider.refresh_token.clone(),
            expires_at: provider.expires_at,
        };
        let role = UserRole::parse(provider.user_type());
        (session, role)
    }
}
