//! Route identifiers used by guards and navigation decisions.

use crate::store::{PlanTier, UserRole};

/// Application routes the core can direct a client toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    SignUp,
    FreePlanDashboard,
    CandidateDashboard,
    RecruiterDashboard,
    Upgrade,
}

impl Route {
    pub fn as_path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::SignUp => "/signup",
            Route::FreePlanDashboard => "/free-plan-dashboard",
            Route::CandidateDashboard => "/candidate-dashboard",
            Route::RecruiterDashboard => "/dashboard",
            Route::Upgrade => "/upgrade",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Landing route for a signed-in user: recruiters go to the recruiter
/// dashboard regardless of plan, candidates land on the dashboard matching
/// their tier, and users without a recognized role fall back to home.
/// An unresolved tier lands candidates on the free-plan dashboard so an
/// outage never over-grants.
pub fn landing_route(role: Option<UserRole>, tier: Option<PlanTier>) -> Route {
    match role {
        Some(UserRole::Recruiter) => Route::RecruiterDashboard,
        Some(UserRole::Candidate) => match tier {
            Some(tier) if tier.is_paid() => Route::CandidateDashboard,
            _ => Route::FreePlanDashboard,
        },
        None => Route::Home,
    }
}
