//! Subscription error boundary: decides what shell to draw around
//! subscription-dependent content.
//!
//! `None` subscription status always means the status could not be
//! resolved, so the boundary offers recovery actions instead of rendering
//! content that would mis-gate.

use crate::store::{StoreSnapshot, SubscriptionStatus};

/// Recovery actions offered by the error screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Re-run the subscription fetch in place.
    RetrySubscriptionFetch,
    /// Reload the whole client.
    Reload,
    /// Navigate home.
    GoHome,
    /// Open a support request with the given address.
    ContactSupport { email: String },
}

/// The error screen's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorScreen {
    pub title: &'static str,
    pub message: &'static str,
    pub actions: Vec<RecoveryAction>,
}

/// What to render around subscription-dependent content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryView {
    /// Subscription status is still being fetched.
    Loading { message: &'static str },
    /// The status could not be resolved.
    Error(ErrorScreen),
    /// Render the wrapped content.
    Content,
}

/// Folds subscription state into a [`BoundaryView`].
#[derive(Debug, Clone)]
pub struct SubscriptionBoundary {
    support_email: String,
}

impl SubscriptionBoundary {
    pub fn new(support_email: impl Into<String>) -> SubscriptionBoundary {
        SubscriptionBoundary {
            support_email: support_email.into(),
        }
    }

    /// Resolves the view for the given subscription state.
    pub fn resolve(
        &self,
        subscription_loading: bool,
        subscription: Option<&SubscriptionStatus>,
    ) -> BoundaryView {
        if subscription_loading {
            return BoundaryView::Loading {
                message: "Loading subscription information...",
            };
        }
        match subscription {
            Some(_) => BoundaryView::Content,
            None => BoundaryView::Error(ErrorScreen {
                title: "Subscription Service Unavailable",
                message: "We're unable to load your subscription information at the moment.",
                actions: vec![
                    RecoveryAction::Reload,
                    RecoveryAction::RetrySubscriptionFetch,
                    RecoveryAction::GoHome,
                    RecoveryAction::ContactSupport {
                        email: self.support_email.clone(),
                    },
                ],
            }),
        }
    }

    /// Convenience over [`SubscriptionBoundary::resolve`] for a full store
    /// snapshot.
    pub fn resolve_snapshot(&self, snapshot: &StoreSnapshot) -> BoundaryView {
        self.resolve(
            snapshot.subscription_loading,
            snapshot.subscription.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PlanTier;

    fn boundary() -> SubscriptionBoundary {
        SubscriptionBoundary::new("support@talentgate.app")
    }

    #[test]
    fn loading_takes_precedence_over_missing_status() {
        let view = boundary().resolve(true, None);
        assert!(matches!(view, BoundaryView::Loading { .. }));
    }

    #[test]
    fn missing_status_offers_recovery_actions() {
        let view = boundary().resolve(false, None);
        let screen = match view {
            BoundaryView::Error(screen) => screen,
            other => panic!("expected error screen, got {:?}", other),
        };
        assert_eq!(screen.title, "Subscription Service Unavailable");
        assert!(screen
            .actions
            .contains(&RecoveryAction::RetrySubscriptionFetch));
        assert!(screen.actions.contains(&RecoveryAction::ContactSupport {
            email: "support@talentgate.app".to_string()
        }));
    }

    #[test]
    fn resolved_status_renders_content() {
        let status = SubscriptionStatus {
            active: false,
            tier: PlanTier::Free,
            end_date: None,
            cancelled: false,
        };
        assert_eq!(boundary().resolve(false, Some(&status)), BoundaryView::Content);
    }
}
