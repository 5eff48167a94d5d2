//! Route guards: pure decisions over a store snapshot.
//!
//! A guard never performs IO and never mutates state; it folds the
//! snapshot into one [`GuardOutcome`]. Decisions follow a fixed order so
//! no rule can observe state an earlier rule already ruled out: loading
//! first, then authentication, then role, then subscription availability,
//! then the plan rules of the specific guard.

use chrono::{DateTime, Utc};

use crate::routes::Route;
use crate::store::{AuthPhase, StoreSnapshot, SubscriptionStatus, UserRole};

/// Access policies for guarded routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any signed-in user with a resolved subscription.
    Authenticated,
    /// Candidate-role routes; paid and free candidates are steered to the
    /// dashboard matching their plan.
    CandidateOnly,
    /// Recruiter-role routes; requires a live recruiter plan.
    RecruiterOnly,
    /// Free-plan routes; paid users are steered to their role's dashboard.
    FreePlanOnly,
}

/// What the client should do with the guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session or subscription state is still being resolved; show a
    /// loading shell and re-evaluate on the next store event.
    Loading,
    /// Navigate away instead of rendering.
    Redirect(Route),
    /// The subscription status could not be resolved; show the
    /// subscription error screen.
    SubscriptionUnavailable,
    /// Render the guarded content.
    Render,
}

impl Guard {
    /// Evaluates the guard against `snapshot` for the route at
    /// `current_path`.
    pub fn evaluate(&self, snapshot: &StoreSnapshot, current_path: &str) -> GuardOutcome {
        self.evaluate_at(snapshot, current_path, Utc::now())
    }

    /// Like [`Guard::evaluate`] with an explicit clock, so end-date rules
    /// can be tested deterministically.
    pub fn evaluate_at(
        &self,
        snapshot: &StoreSnapshot,
        current_path: &str,
        now: DateTime<Utc>,
    ) -> GuardOutcome {
        match snapshot.phase() {
            AuthPhase::Initializing | AuthPhase::AwaitingSubscription => GuardOutcome::Loading,
            AuthPhase::Unauthenticated => GuardOutcome::Redirect(Route::Login),
            AuthPhase::SubscriptionUnavailable => {
                if !self.role_permitted(snapshot.role) {
                    GuardOutcome::Redirect(Route::Login)
                } else {
                    GuardOutcome::SubscriptionUnavailable
                }
            }
            AuthPhase::Ready => {
                if !self.role_permitted(snapshot.role) {
                    return GuardOutcome::Redirect(Route::Login);
                }
                // Ready guarantees a resolved status.
                let status = match snapshot.subscription.as_ref() {
                    Some(status) => status,
                    None => return GuardOutcome::SubscriptionUnavailable,
                };
                self.plan_rule(snapshot, status, current_path, now)
            }
        }
    }

    fn role_permitted(&self, role: Option<UserRole>) -> bool {
        match self {
            Guard::Authenticated | Guard::FreePlanOnly => true,
            Guard::CandidateOnly => role == Some(UserRole::Candidate),
            Guard::RecruiterOnly => role == Some(UserRole::Recruiter),
        }
    }

    fn plan_rule(
        &self,
        snapshot: &StoreSnapshot,
        status: &SubscriptionStatus,
        current_path: &str,
        now: DateTime<Utc>,
    ) -> GuardOutcome {
        match self {
            Guard::Authenticated => GuardOutcome::Render,
            Guard::CandidateOnly => {
                let paid = status.has_active_paid(now);
                if paid && current_path == Route::FreePlanDashboard.as_path() {
                    return GuardOutcome::Redirect(Route::CandidateDashboard);
                }
                if !paid && current_path == Route::CandidateDashboard.as_path() {
                    return GuardOutcome::Redirect(Route::FreePlanDashboard);
                }
                GuardOutcome::Render
            }
            Guard::RecruiterOnly => {
                if !status.tier.is_paid()
                    || !status.active
                    || status.cancellation_elapsed(now)
                {
                    return GuardOutcome::Redirect(Route::FreePlanDashboard);
                }
                GuardOutcome::Render
            }
            Guard::FreePlanOnly => {
                // An uncancelled, active paid plan has no business on the
                // free-plan pages; cancelled plans keep access to them.
                if status.tier.is_paid() && status.active && !status.cancelled {
                    return match snapshot.role {
                        Some(UserRole::Recruiter) => {
                            GuardOutcome::Redirect(Route::RecruiterDashboard)
                        }
                        Some(UserRole::Candidate) => {
                            GuardOutcome::Redirect(Route::CandidateDashboard)
                        }
                        None => GuardOutcome::Render,
                    };
                }
                GuardOutcome::Render
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PlanTier, Session};
    use chrono::Duration;

    const ALL_GUARDS: [Guard; 4] = [
        Guard::Authenticated,
        Guard::CandidateOnly,
        Guard::RecruiterOnly,
        Guard::FreePlanOnly,
    ];

    fn session() -> Session {
        Session {
            user_id: "user-1".to_string(),
            email: Some("user-1@example.com".to_string()),
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
        }
    }

    fn status(tier: PlanTier) -> SubscriptionStatus {
        SubscriptionStatus {
            active: tier.is_paid(),
            tier,
            end_date: None,
            cancelled: false,
        }
    }

    fn settled(role: Option<UserRole>, subscription: Option<SubscriptionStatus>) -> StoreSnapshot {
        StoreSnapshot {
            session: Some(session()),
            role,
            restoring_session: false,
            subscription,
            subscription_loading: false,
            epoch: 1,
        }
    }

    fn signed_out() -> StoreSnapshot {
        StoreSnapshot {
            session: None,
            role: None,
            restoring_session: false,
            subscription: Some(SubscriptionStatus::logged_out()),
            subscription_loading: false,
            epoch: 1,
        }
    }

    #[test]
    fn every_guard_waits_during_restoration() {
        let snapshot = StoreSnapshot::default();
        for guard in ALL_GUARDS {
            assert_eq!(guard.evaluate(&snapshot, "/dashboard"), GuardOutcome::Loading);
        }
    }

    #[test]
    fn every_guard_waits_while_subscription_loads() {
        let mut snapshot = settled(Some(UserRole::Candidate), None);
        snapshot.subscription_loading = true;
        for guard in ALL_GUARDS {
            assert_eq!(
                guard.evaluate(&snapshot, "/candidate-dashboard"),
                GuardOutcome::Loading
            );
        }
    }

    #[test]
    fn every_guard_redirects_signed_out_users_to_login() {
        let snapshot = signed_out();
        for guard in ALL_GUARDS {
            assert_eq!(
                guard.evaluate(&snapshot, "/dashboard"),
                GuardOutcome::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn unresolved_status_shows_the_error_screen_not_content() {
        let snapshot = settled(Some(UserRole::Candidate), None);
        for guard in [Guard::Authenticated, Guard::CandidateOnly, Guard::FreePlanOnly] {
            assert_eq!(
                guard.evaluate(&snapshot, "/candidate-dashboard"),
                GuardOutcome::SubscriptionUnavailable
            );
        }
        // Role still wins over the error screen.
        assert_eq!(
            Guard::RecruiterOnly.evaluate(&snapshot, "/dashboard"),
            GuardOutcome::Redirect(Route::Login)
        );
    }

    #[test]
    fn role_mismatch_redirects_to_login() {
        let snapshot = settled(Some(UserRole::Recruiter), Some(status(PlanTier::Recruiter)));
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/candidate-dashboard"),
            GuardOutcome::Redirect(Route::Login)
        );

        let snapshot = settled(Some(UserRole::Candidate), Some(status(PlanTier::Premium)));
        assert_eq!(
            Guard::RecruiterOnly.evaluate(&snapshot, "/dashboard"),
            GuardOutcome::Redirect(Route::Login)
        );

        let snapshot = settled(None, Some(status(PlanTier::Premium)));
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/candidate-dashboard"),
            GuardOutcome::Redirect(Route::Login)
        );
    }

    #[test]
    fn paid_candidate_is_steered_off_the_free_dashboard() {
        let snapshot = settled(Some(UserRole::Candidate), Some(status(PlanTier::Premium)));
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Redirect(Route::CandidateDashboard)
        );
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/candidate-dashboard"),
            GuardOutcome::Render
        );
    }

    #[test]
    fn free_candidate_is_steered_off_the_paid_dashboard() {
        let snapshot = settled(Some(UserRole::Candidate), Some(status(PlanTier::Free)));
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/candidate-dashboard"),
            GuardOutcome::Redirect(Route::FreePlanDashboard)
        );
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Render
        );
        // Other candidate pages render for both plans.
        assert_eq!(
            Guard::CandidateOnly.evaluate(&snapshot, "/ats-scan"),
            GuardOutcome::Render
        );
    }

    #[test]
    fn cancelled_paid_plan_keeps_access_until_end_date() {
        let now = Utc::now();
        let mut with_grace = status(PlanTier::Premium);
        with_grace.cancelled = true;
        with_grace.end_date = Some(now + Duration::days(10));
        let snapshot = settled(Some(UserRole::Candidate), Some(with_grace));
        assert_eq!(
            Guard::CandidateOnly.evaluate_at(&snapshot, "/candidate-dashboard", now),
            GuardOutcome::Render
        );

        let mut expired = status(PlanTier::Premium);
        expired.cancelled = true;
        expired.end_date = Some(now - Duration::days(1));
        let snapshot = settled(Some(UserRole::Candidate), Some(expired));
        assert_eq!(
            Guard::CandidateOnly.evaluate_at(&snapshot, "/candidate-dashboard", now),
            GuardOutcome::Redirect(Route::FreePlanDashboard)
        );
    }

    #[test]
    fn recruiter_routes_require_a_live_plan() {
        let now = Utc::now();
        let snapshot = settled(Some(UserRole::Recruiter), Some(status(PlanTier::Recruiter)));
        assert_eq!(
            Guard::RecruiterOnly.evaluate_at(&snapshot, "/dashboard", now),
            GuardOutcome::Render
        );

        let snapshot = settled(Some(UserRole::Recruiter), Some(status(PlanTier::Free)));
        assert_eq!(
            Guard::RecruiterOnly.evaluate_at(&snapshot, "/dashboard", now),
            GuardOutcome::Redirect(Route::FreePlanDashboard)
        );

        let mut inactive = status(PlanTier::Recruiter);
        inactive.active = false;
        let snapshot = settled(Some(UserRole::Recruiter), Some(inactive));
        assert_eq!(
            Guard::RecruiterOnly.evaluate_at(&snapshot, "/dashboard", now),
            GuardOutcome::Redirect(Route::FreePlanDashboard)
        );

        let mut lapsed = status(PlanTier::Recruiter);
        lapsed.cancelled = true;
        lapsed.end_date = Some(now - Duration::days(2));
        let snapshot = settled(Some(UserRole::Recruiter), Some(lapsed));
        assert_eq!(
            Guard::RecruiterOnly.evaluate_at(&snapshot, "/dashboard", now),
            GuardOutcome::Redirect(Route::FreePlanDashboard)
        );

        // Cancelled but still inside the paid period.
        let mut grace = status(PlanTier::Recruiter);
        grace.cancelled = true;
        grace.end_date = Some(now + Duration::days(2));
        let snapshot = settled(Some(UserRole::Recruiter), Some(grace));
        assert_eq!(
            Guard::RecruiterOnly.evaluate_at(&snapshot, "/dashboard", now),
            GuardOutcome::Render
        );
    }

    #[test]
    fn free_plan_routes_deflect_uncancelled_paid_users() {
        let snapshot = settled(Some(UserRole::Candidate), Some(status(PlanTier::Basic)));
        assert_eq!(
            Guard::FreePlanOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Redirect(Route::CandidateDashboard)
        );

        let snapshot = settled(Some(UserRole::Recruiter), Some(status(PlanTier::Recruiter)));
        assert_eq!(
            Guard::FreePlanOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Redirect(Route::RecruiterDashboard)
        );

        // No recognized role: nothing to steer toward.
        let snapshot = settled(None, Some(status(PlanTier::Premium)));
        assert_eq!(
            Guard::FreePlanOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Render
        );

        // A cancelled paid plan keeps free-plan access even before its end
        // date passes.
        let mut cancelled = status(PlanTier::Premium);
        cancelled.cancelled = true;
        cancelled.end_date = Some(Utc::now() + Duration::days(30));
        let snapshot = settled(Some(UserRole::Candidate), Some(cancelled));
        assert_eq!(
            Guard::FreePlanOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Render
        );

        let snapshot = settled(Some(UserRole::Candidate), Some(status(PlanTier::Free)));
        assert_eq!(
            Guard::FreePlanOnly.evaluate(&snapshot, "/free-plan-dashboard"),
            GuardOutcome::Render
        );
    }

    #[test]
    fn authenticated_guard_renders_for_any_resolved_plan() {
        for tier in [PlanTier::Free, PlanTier::Basic, PlanTier::Premium, PlanTier::Recruiter] {
            let snapshot = settled(Some(UserRole::Candidate), Some(status(tier)));
            assert_eq!(
                Guard::Authenticated.evaluate(&snapshot, "/account"),
                GuardOutcome::Render
            );
        }
    }
}
