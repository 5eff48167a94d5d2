//! Subscription endpoints
//!
//! The backend keys the current subscription off the bearer token, so
//! `current` takes no parameters. Payload fields are snake_case on the
//! wire; dates are ISO-8601 strings.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::fetch::Fetch;
use crate::ApiClient;

/// Subscription record as the backend returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub subscription_type: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_cancelled: Option<bool>,
}

/// Response of the upgrade endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subscription: Option<SubscriptionRecord>,
}

/// Handle for the subscription endpoint group
pub struct SubscriptionApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SubscriptionApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the authenticated user's current subscription.
    ///
    /// `Ok(None)` means the backend answered but reported no
    /// subscription row for this user.
    pub async fn current(&self) -> Result<Option<SubscriptionRecord>, ApiError> {
        let url = format!("{}/subscription/current", self.client.base_url());

        let value: serde_json::Value = Fetch::get(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .execute()
            .await?;

        if value.is_null() {
            debug!("subscription/current: no subscription on record");
            return Ok(None);
        }

        let record: SubscriptionRecord = serde_json::from_value(value)?;
        Ok(Some(record))
    }

    /// Move the authenticated user to a different plan.
    pub async fn upgrade(&self, subscription_type: &str) -> Result<UpgradeResponse, ApiError> {
        let url = format!("{}/subscription/upgrade", self.client.base_url());

        let payload = serde_json::json!({
            "subscriptionType": subscription_type,
        });

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .json(&payload)?
            .execute()
            .await
    }

    /// Cancel the authenticated user's subscription. The plan stays
    /// usable until its end date; the backend flips the cancelled flag.
    pub async fn cancel(&self) -> Result<(), ApiError> {
        let url = format!("{}/subscription/cancel", self.client.base_url());

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .execute_unit()
            .await
    }
}
