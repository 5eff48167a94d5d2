//! Subscription status resolution and plan changes.
//!
//! The resolver is the only writer of `StoreSnapshot::subscription`. Every
//! fetch is tagged with the epoch it was started under; the store discards
//! completions whose epoch no longer matches, so a slow response for a
//! previous user can never clobber the current user's status. Failures
//! resolve the status to `None` rather than erroring, which routes the UI
//! to the subscription error screen instead of mis-gating.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::auth::AuthCore;
use crate::error::Error;
use crate::routes::{landing_route, Route};
use crate::store::{Notice, PlanTier, SubscriptionStatus};
use talentgate_api::SubscriptionRecord;

impl AuthCore {
    /// Re-runs the subscription fetch for the current user. Used by the
    /// error screen's retry action; a fetch already in flight is awaited
    /// instead of duplicated.
    pub async fn refresh_subscription(&self) {
        let epoch = self.store().current_epoch();
        self.resolve_subscription(epoch).await;
    }

    /// Ensures a subscription fetch for `epoch` runs to completion. Exactly
    /// one request is in flight per epoch: the first caller claims it,
    /// later callers wait for the published result. Returns once the store
    /// has settled (or the epoch has been superseded).
    pub(crate) async fn resolve_subscription(&self, epoch: u64) {
        if self.store().snapshot().session.is_none() {
            debug!("Skipping subscription fetch: no active session");
            return;
        }
        if self.store().begin_subscription_fetch(epoch) {
            let status = self.fetch_status().await;
            if !self.store().complete_subscription_fetch(epoch, status) {
                debug!("Discarded subscription result for a superseded session");
            }
        } else {
            self.await_subscription_settled(epoch).await;
        }
    }

    /// Waits until no fetch for `epoch` is pending. Returns immediately
    /// when the epoch has been superseded.
    async fn await_subscription_settled(&self, epoch: u64) {
        let mut events = self.store().subscribe();
        loop {
            let snapshot = self.store().snapshot();
            if snapshot.epoch != epoch {
                return;
            }
            if !snapshot.subscription_loading && !self.store().fetch_in_flight(epoch) {
                return;
            }
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            }
        }
    }

    async fn fetch_status(&self) -> Option<SubscriptionStatus> {
        match self.services.subscription.current().await {
            Ok(Some(record)) => Some(status_from_record(record)),
            Ok(None) => {
                warn!("Subscription endpoint returned an empty payload");
                None
            }
            Err(e) => {
                warn!("Failed to fetch subscription status: {}", e);
                None
            }
        }
    }

    /// Moves the signed-in user to `tier` and re-resolves the status from
    /// the backend before returning. The returned route is the landing
    /// page matching the *refreshed* state, so callers navigate on what
    /// the backend actually recorded rather than on the requested tier.
    pub async fn update_subscription(&self, tier: PlanTier) -> Result<Route, Error> {
        if self.store().snapshot().session.is_none() {
            self.store().notify(Notice::error(
                "You must be logged in to upgrade your subscription.",
            ));
            return Err(Error::MissingSession);
        }

        debug!("Updating subscription to {}", tier);
        let response = match self.services.subscription.upgrade(tier.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                self.store()
                    .notify(Notice::error(format!("Failed to update subscription: {}", e)));
                return Err(Error::Api(e));
            }
        };
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "The subscription change was rejected".to_string());
            self.store()
                .notify(Notice::error(format!("Failed to update subscription: {}", message)));
            return Err(Error::subscription(message));
        }

        // The upgrade response may describe the new plan, but the status of
        // record always comes from a fresh fetch.
        self.resolve_subscription(self.store().current_epoch()).await;

        let snapshot = self.store().snapshot();
        self.store().notify(Notice::success(format!(
            "Your subscription has been updated to {}.",
            tier
        )));
        Ok(landing_route(
            snapshot.role,
            snapshot.subscription.map(|status| status.tier),
        ))
    }

    /// Cancels the signed-in user's subscription. The plan keeps working
    /// until its end date; the refreshed status carries the cancelled flag
    /// and end date the backend recorded.
    pub async fn cancel_subscription(&self) -> Result<(), Error> {
        if self.store().snapshot().session.is_none() {
            return Err(Error::MissingSession);
        }

        if let Err(e) = self.services.subscription.cancel().await {
            self.store()
                .notify(Notice::error(format!("Failed to cancel subscription: {}", e)));
            return Err(Error::Api(e));
        }

        self.resolve_subscription(self.store().current_epoch()).await;
        self.store().notify(Notice::success(
            "Your subscription has been cancelled. You keep access until the end of the paid period.",
        ));
        Ok(())
    }
}

/// Maps a backend subscription record into the domain status.
///
/// `active` is derived from the tier (a free plan is never "active paid")
/// and further constrained by an explicit `is_active: false` from the
/// backend. Malformed end dates are dropped rather than failing the whole
/// status.
pub(crate) fn status_from_record(record: SubscriptionRecord) -> SubscriptionStatus {
    let tier = PlanTier::from_wire(&record.subscription_type);
    let end_date = record.end_date.as_deref().and_then(parse_end_date);
    SubscriptionStatus {
        active: tier.is_paid() && record.is_active.unwrap_or(true),
        tier,
        end_date,
        cancelled: record.is_cancelled.unwrap_or(false),
    }
}

fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring malformed subscription end date '{}': {}", raw, e);
            None
        }
    }
}
