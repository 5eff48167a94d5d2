//! Usage metering and activity-log endpoints
//!
//! Counters are keyed by `(userId, featureType)`. Unlike the
//! subscription payloads these travel camelCase on the wire. A
//! `usageLimit` of zero or below means the plan puts no cap on the
//! feature.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::fetch::Fetch;
use crate::ApiClient;

/// One feature counter as the backend returns it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "usageCount")]
    pub usage_count: u32,
    #[serde(rename = "usageLimit")]
    pub usage_limit: i64,
}

/// Response of the increment endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct IncrementResponse {
    #[serde(rename = "newCount")]
    pub new_count: u32,
    #[serde(rename = "usageLimit", default)]
    pub usage_limit: Option<i64>,
}

/// Handle for the usage endpoint group
pub struct UsageApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsageApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch one feature counter.
    pub async fn get(&self, user_id: &str, feature: &str) -> Result<UsageRecord, ApiError> {
        let url = format!("{}/usage/{}/{}", self.client.base_url(), user_id, feature);

        Fetch::get(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .execute()
            .await
    }

    /// Fetch every feature counter for the user, keyed by feature name.
    pub async fn get_all(&self, user_id: &str) -> Result<HashMap<String, UsageRecord>, ApiError> {
        let url = format!("{}/usage/all/{}", self.client.base_url(), user_id);

        Fetch::get(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .execute()
            .await
    }

    /// Record one use of a feature and return the authoritative count.
    pub async fn increment(
        &self,
        user_id: &str,
        feature: &str,
    ) -> Result<IncrementResponse, ApiError> {
        let url = format!("{}/usage/increment", self.client.base_url());

        let payload = serde_json::json!({
            "userId": user_id,
            "featureType": feature,
        });

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .json(&payload)?
            .execute()
            .await
    }

    /// Zero one feature counter.
    pub async fn reset(&self, user_id: &str, feature: &str) -> Result<(), ApiError> {
        let url = format!("{}/usage/reset", self.client.base_url());

        let payload = serde_json::json!({
            "userId": user_id,
            "featureType": feature,
        });

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .json(&payload)?
            .execute_unit()
            .await
    }

    /// Append an entry to the activity log. The acting user is derived
    /// server-side from the bearer token.
    pub async fn log_activity(&self, action_type: &str, description: &str) -> Result<(), ApiError> {
        let url = format!("{}/usage/log-activity", self.client.base_url());

        let payload = serde_json::json!({
            "actionType": action_type,
            "description": description,
        });

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .json(&payload)?
            .execute_unit()
            .await
    }
}
