//! Session and subscription state shared across the client.
//!
//! A single [`AuthStore`] owns everything the access-control layer needs:
//! the signed-in session, the user's role, the resolved subscription status
//! and the two loading flags that gate route decisions. All mutation goes
//! through the store so that readers always observe a consistent snapshot,
//! and every change is broadcast as a [`StoreEvent`] for observers such as
//! route guards or UI layers.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Signed-in user as tracked by the client core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp at which the access token expires, when known.
    pub expires_at: Option<i64>,
}

/// Role recorded in the identity provider's user metadata at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Candidate,
    Recruiter,
}

impl UserRole {
    /// Parses the `user_type` metadata value. Absent or unrecognized
    /// metadata yields `None`; role-gated routes then refuse access rather
    /// than guessing a role.
    pub fn parse(user_type: Option<&str>) -> Option<UserRole> {
        match user_type {
            Some("candidate") => Some(UserRole::Candidate),
            Some("recruiter") => Some(UserRole::Recruiter),
            Some(other) => {
                warn!("Unrecognized user role '{}', treating as no role", other);
                None
            }
            None => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Candidate => "candidate",
            UserRole::Recruiter => "recruiter",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Basic,
    Premium,
    Recruiter,
}

impl PlanTier {
    /// Maps the `subscription_type` string from the backend. Unknown tiers
    /// degrade to `Free` so a new plan name rolled out server-side never
    /// grants accidental access.
    pub fn from_wire(value: &str) -> PlanTier {
        match value {
            "free" => PlanTier::Free,
            "basic" => PlanTier::Basic,
            "premium" => PlanTier::Premium,
            "recruiter" => PlanTier::Recruiter,
            other => {
                warn!("Unknown subscription type '{}', treating as free", other);
                PlanTier::Free
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
            PlanTier::Recruiter => "recruiter",
        }
    }

    /// Anything above the free tier counts as paid.
    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// Free and basic plans have per-feature usage limits enforced
    /// client-side before an operation runs.
    pub fn is_metered(&self) -> bool {
        matches!(self, PlanTier::Free | PlanTier::Basic)
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved subscription state for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStatus {
    pub active: bool,
    pub tier: PlanTier,
    pub end_date: Option<DateTime<Utc>>,
    pub cancelled: bool,
}

impl SubscriptionStatus {
    /// The deterministic status applied on sign-out.
    pub fn logged_out() -> SubscriptionStatus {
        SubscriptionStatus {
            active: false,
            tier: PlanTier::Free,
            end_date: None,
            cancelled: false,
        }
    }

    /// Whether the user holds a paid subscription that is still in force.
    /// A cancelled plan stays in force until its end date passes; a
    /// cancelled plan without an end date is treated as ended.
    pub fn has_active_paid(&self, now: DateTime<Utc>) -> bool {
        if !self.tier.is_paid() || !self.active {
            return false;
        }
        if !self.cancelled {
            return true;
        }
        match self.end_date {
            Some(end) => now < end,
            None => false,
        }
    }

    /// Whether a cancellation has already taken effect. A cancelled plan
    /// with no end date has no remaining grace period here either, but the
    /// strict comparison keeps access until the recorded end passes.
    pub fn cancellation_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.cancelled && self.end_date.map(|end| now > end).unwrap_or(false)
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A message the UI should surface to the user (toast, banner, log line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Notice {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Change notifications broadcast by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Session, role or the restoration flag changed.
    SessionChanged,
    /// Subscription status or its loading flag changed.
    SubscriptionChanged,
    /// A user-facing notice was published.
    Notice(Notice),
}

/// Coarse lifecycle phase derived from a snapshot. Guards and UI shells
/// branch on this instead of re-deriving flag combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Session restoration has not finished yet.
    Initializing,
    /// No signed-in user.
    Unauthenticated,
    /// Signed in, subscription status still being fetched.
    AwaitingSubscription,
    /// Signed in but the subscription status could not be resolved.
    SubscriptionUnavailable,
    /// Signed in with a resolved subscription status.
    Ready,
}

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub session: Option<Session>,
    pub role: Option<UserRole>,
    /// True until the initial session restoration has run to completion.
    pub restoring_session: bool,
    /// `None` means the status could not be resolved, never "no plan";
    /// users without a paid plan resolve to an inactive free status.
    pub subscription: Option<SubscriptionStatus>,
    pub subscription_loading: bool,
    /// Monotonic counter bumped whenever the owning user changes. Fetches
    /// are tagged with the epoch they were started under so late responses
    /// for a previous user are discarded.
    pub epoch: u64,
}

impl StoreSnapshot {
    pub fn phase(&self) -> AuthPhase {
        if self.restoring_session {
            return AuthPhase::Initializing;
        }
        match &self.session {
            None => AuthPhase::Unauthenticated,
            Some(_) if self.subscription_loading => AuthPhase::AwaitingSubscription,
            Some(_) => match self.subscription {
                Some(_) => AuthPhase::Ready,
                None => AuthPhase::SubscriptionUnavailable,
            },
        }
    }
}

impl Default for StoreSnapshot {
    fn default() -> StoreSnapshot {
        StoreSnapshot {
            session: None,
            role: None,
            restoring_session: true,
            subscription: None,
            subscription_loading: true,
            epoch: 0,
        }
    }
}

/// Result of applying a session to the store.
#[derive(Debug, Clone, Copy)]
pub struct SessionApplied {
    /// Epoch in force after the apply; fetches started for this session
    /// must carry it.
    pub epoch: u64,
    /// True when the owning user changed to a signed-in user, i.e. a
    /// subscription fetch is due.
    pub needs_fetch: bool,
}

struct StoreState {
    snapshot: StoreSnapshot,
    /// Epoch of the fetch currently in flight, if any.
    fetch_in_flight: Option<u64>,
}

/// Shared, thread-safe owner of session and subscription state.
#[derive(Clone)]
pub struct AuthStore {
    state: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for AuthStore {
    fn default() -> AuthStore {
        AuthStore::new()
    }
}

impl AuthStore {
    pub fn new() -> AuthStore {
        let (events, _) = broadcast::channel(32);
        AuthStore {
            state: Arc::new(RwLock::new(StoreState {
                snapshot: StoreSnapshot::default(),
                fetch_in_flight: None,
            })),
            events,
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().unwrap().snapshot.clone()
    }

    /// Subscribes to store change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn current_epoch(&self) -> u64 {
        self.state.read().unwrap().snapshot.epoch
    }

    /// Publishes a user-facing notice.
    pub fn notify(&self, notice: Notice) {
        let _ = self.events.send(StoreEvent::Notice(notice));
    }

    /// Replaces the session (and role) and reconciles dependent state.
    ///
    /// When the owning user changes the epoch is bumped, which invalidates
    /// any in-flight subscription fetch. A transition to a signed-in user
    /// clears the previous status and raises `subscription_loading` in the
    /// same write so observers never see a signed-in snapshot that looks
    /// settled before its fetch has started. A transition to signed-out
    /// pins the deterministic logged-out status.
    pub fn apply_session(
        &self,
        session: Option<Session>,
        role: Option<UserRole>,
    ) -> SessionApplied {
        let mut session_changed = false;
        let mut subscription_changed = false;
        let applied = {
            let mut state = self.state.write().unwrap();
            let previous_user = state.snapshot.session.as_ref().map(|s| s.user_id.clone());
            let next_user = session.as_ref().map(|s| s.user_id.clone());
            let user_changed = previous_user != next_user;

            if state.snapshot.session != session || state.snapshot.role != role {
                session_changed = true;
            }
            state.snapshot.session = session;
            state.snapshot.role = role;

            if user_changed {
                state.snapshot.epoch += 1;
                state.fetch_in_flight = None;
                subscription_changed = true;
                match next_user {
                    Some(_) => {
                        state.snapshot.subscription = None;
                        state.snapshot.subscription_loading = true;
                    }
                    None => {
                        state.snapshot.subscription = Some(SubscriptionStatus::logged_out());
                        state.snapshot.subscription_loading = false;
                    }
                }
            } else if next_user.is_none() && state.snapshot.subscription_loading {
                // Initial restoration found no session: nothing to fetch.
                state.snapshot.subscription = Some(SubscriptionStatus::logged_out());
                state.snapshot.subscription_loading = false;
                subscription_changed = true;
            }

            SessionApplied {
                epoch: state.snapshot.epoch,
                needs_fetch: user_changed && state.snapshot.session.is_some(),
            }
        };
        if session_changed {
            let _ = self.events.send(StoreEvent::SessionChanged);
        }
        if subscription_changed {
            let _ = self.events.send(StoreEvent::SubscriptionChanged);
        }
        applied
    }

    /// Marks the initial session restoration as finished.
    pub fn mark_restored(&self) {
        {
            let mut state = self.state.write().unwrap();
            if !state.snapshot.restoring_session {
                return;
            }
            state.snapshot.restoring_session = false;
        }
        let _ = self.events.send(StoreEvent::SessionChanged);
    }

    /// Claims the subscription fetch for `epoch`. Returns false when the
    /// epoch is stale or a fetch for it is already in flight, in which case
    /// the caller must not issue a request.
    pub fn begin_subscription_fetch(&self, epoch: u64) -> bool {
        let begun = {
            let mut state = self.state.write().unwrap();
            if state.snapshot.epoch != epoch {
                return false;
            }
            if state.fetch_in_flight == Some(epoch) {
                return false;
            }
            state.fetch_in_flight = Some(epoch);
            state.snapshot.subscription_loading = true;
            true
        };
        if begun {
            let _ = self.events.send(StoreEvent::SubscriptionChanged);
        }
        begun
    }

    /// Publishes the outcome of a subscription fetch started under `epoch`.
    /// Returns false when the result was discarded because the owning user
    /// changed while the request was in flight.
    pub fn complete_subscription_fetch(
        &self,
        epoch: u64,
        status: Option<SubscriptionStatus>,
    ) -> bool {
        let accepted = {
            let mut state = self.state.write().unwrap();
            if state.fetch_in_flight == Some(epoch) {
                state.fetch_in_flight = None;
            }
            if state.snapshot.epoch != epoch {
                return false;
            }
            state.snapshot.subscription = status;
            state.snapshot.subscription_loading = false;
            true
        };
        if accepted {
            let _ = self.events.send(StoreEvent::SubscriptionChanged);
        }
        accepted
    }

    /// Whether a subscription fetch is currently in flight for `epoch`.
    pub(crate) fn fetch_in_flight(&self, epoch: u64) -> bool {
        self.state.read().unwrap().fetch_in_flight == Some(epoch)
    }
}
