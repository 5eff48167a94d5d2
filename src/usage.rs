//! Usage metering: per-feature counters, allowances and the metered-call
//! wrapper.
//!
//! Counters live server-side; this module decides *before* a metered
//! operation runs whether the plan still allows it, and records the use
//! afterwards. Plans above basic bypass metering entirely, so for them no
//! counter is consulted up front.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

use crate::auth::AuthCore;
use crate::error::Error;
use crate::store::PlanTier;
use talentgate_api::UsageRecord;

/// Features whose use is counted per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ResumeCustomization,
    ResumeOptimization,
    ResumeBuilder,
    AtsScan,
    SalaryInsights,
    CoverLetter,
    InterviewQuestions,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::ResumeCustomization,
        Feature::ResumeOptimization,
        Feature::ResumeBuilder,
        Feature::AtsScan,
        Feature::SalaryInsights,
        Feature::CoverLetter,
        Feature::InterviewQuestions,
    ];

    /// Key used by the usage endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ResumeCustomization => "resume_customization",
            Feature::ResumeOptimization => "resume_optimization",
            Feature::ResumeBuilder => "resume_builder",
            Feature::AtsScan => "ats_scan",
            Feature::SalaryInsights => "salary_insights",
            Feature::CoverLetter => "cover_letter",
            Feature::InterviewQuestions => "interview_questions",
        }
    }

    /// Parses a wire key. Unknown keys yield `None` so new server-side
    /// features don't break existing clients.
    pub fn from_key(key: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.as_str() == key)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feature counter for the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureUsage {
    pub usage_count: u32,
    /// Zero or negative means the plan puts no cap on this feature.
    pub usage_limit: i64,
}

impl FeatureUsage {
    pub fn allowance(&self) -> Allowance {
        if self.usage_limit <= 0 {
            return Allowance::Unlimited;
        }
        if i64::from(self.usage_count) >= self.usage_limit {
            Allowance::Exhausted
        } else {
            Allowance::Remaining((self.usage_limit - i64::from(self.usage_count)) as u32)
        }
    }
}

impl From<UsageRecord> for FeatureUsage {
    fn from(record: UsageRecord) -> FeatureUsage {
        FeatureUsage {
            usage_count: record.usage_count,
            usage_limit: record.usage_limit,
        }
    }
}

/// Whether a metered feature may run, and how much headroom is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    /// The plan does not cap this feature.
    Unlimited,
    /// Uses left before the cap is reached.
    Remaining(u32),
    /// The cap is reached; the operation must not run.
    Exhausted,
}

impl Allowance {
    pub fn permits_use(&self) -> bool {
        !matches!(self, Allowance::Exhausted)
    }
}

/// Outcome of recording one feature use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedUse {
    /// Counter value after the use. When `reliable` is false this is a
    /// local best guess, not the server's number.
    pub count: u32,
    pub reliable: bool,
}

impl AuthCore {
    /// Fetches one feature counter for the signed-in user.
    pub async fn feature_usage(&self, feature: Feature) -> Result<FeatureUsage, Error> {
        let user_id = self.require_user_id()?;
        let record = self.services.usage.get(&user_id, feature.as_str()).await?;
        Ok(FeatureUsage::from(record))
    }

    /// Fetches every feature counter for the signed-in user. Counters whose
    /// key no client-side feature matches are skipped.
    pub async fn all_feature_usage(&self) -> Result<HashMap<Feature, FeatureUsage>, Error> {
        let user_id = self.require_user_id()?;
        let records = self.services.usage.get_all(&user_id).await?;
        let mut usage = HashMap::with_capacity(records.len());
        for (key, record) in records {
            match Feature::from_key(&key) {
                Some(feature) => {
                    usage.insert(feature, FeatureUsage::from(record));
                }
                None => debug!("Ignoring usage counter for unknown feature '{}'", key),
            }
        }
        Ok(usage)
    }

    /// Pre-flight check for a metered operation. Plans above basic are
    /// never capped; for free and basic plans the current counter decides.
    /// When the subscription status is unresolved the free-tier rules
    /// apply, so an outage never over-grants.
    pub async fn check_allowance(&self, feature: Feature) -> Result<Allowance, Error> {
        self.require_user_id()?;
        let tier = self
            .store()
            .snapshot()
            .subscription
            .map(|status| status.tier)
            .unwrap_or(PlanTier::Free);
        if !tier.is_metered() {
            return Ok(Allowance::Unlimited);
        }
        let usage = self.feature_usage(feature).await?;
        Ok(usage.allowance())
    }

    /// Records one use of a feature. Never fails: when the backend cannot
    /// confirm the new counter value, a local fallback of one use is
    /// reported and flagged as unreliable.
    pub async fn record_use(&self, feature: Feature) -> RecordedUse {
        let user_id = match self.store().snapshot().session {
            Some(session) => session.user_id,
            None => {
                warn!("Ignoring usage record for {}: no active session", feature);
                return RecordedUse {
                    count: 0,
                    reliable: false,
                };
            }
        };
        match self.services.usage.increment(&user_id, feature.as_str()).await {
            Ok(response) => RecordedUse {
                count: response.new_count,
                reliable: true,
            },
            Err(e) => {
                warn!("Failed to record use of {}: {}", feature, e);
                RecordedUse {
                    count: 1,
                    reliable: false,
                }
            }
        }
    }

    /// Zeroes a feature counter and appends a `usage_reset` entry to the
    /// activity log. A failed log entry does not fail the reset.
    pub async fn reset_usage(&self, feature: Feature) -> Result<(), Error> {
        let user_id = self.require_user_id()?;
        self.services.usage.reset(&user_id, feature.as_str()).await?;
        let description = format!("Reset usage count for {}", feature);
        if let Err(e) = self.services.activity.log("usage_reset", &description).await {
            warn!("Failed to log usage reset for {}: {}", feature, e);
        }
        Ok(())
    }

    /// Runs `operation` if the feature's allowance permits it, recording
    /// the use afterwards. The operation never runs when the allowance is
    /// exhausted, and a failed operation is not counted.
    pub async fn metered<T, F, Fut>(
        &self,
        feature: Feature,
        operation: F,
    ) -> Result<(T, RecordedUse), Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let allowance = self.check_allowance(feature).await?;
        if !allowance.permits_use() {
            return Err(Error::LimitReached {
                feature,
                message: "Upgrade your plan to continue using this feature.".to_string(),
            });
        }
        let value = operation().await?;
        let recorded = self.record_use(feature).await;
        Ok((value, recorded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowance_treats_nonpositive_limits_as_unlimited() {
        let unlimited = FeatureUsage {
            usage_count: 42,
            usage_limit: 0,
        };
        assert_eq!(unlimited.allowance(), Allowance::Unlimited);

        let sentinel = FeatureUsage {
            usage_count: 42,
            usage_limit: -1,
        };
        assert_eq!(sentinel.allowance(), Allowance::Unlimited);
    }

    #[test]
    fn allowance_exhausts_at_the_limit() {
        let at_limit = FeatureUsage {
            usage_count: 5,
            usage_limit: 5,
        };
        assert_eq!(at_limit.allowance(), Allowance::Exhausted);
        assert!(!at_limit.allowance().permits_use());

        let over_limit = FeatureUsage {
            usage_count: 7,
            usage_limit: 5,
        };
        assert_eq!(over_limit.allowance(), Allowance::Exhausted);

        let below_limit = FeatureUsage {
            usage_count: 3,
            usage_limit: 5,
        };
        assert_eq!(below_limit.allowance(), Allowance::Remaining(2));
    }

    #[test]
    fn feature_keys_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_key(feature.as_str()), Some(feature));
        }
        assert_eq!(Feature::from_key("resume_analysis"), None);
    }
}
