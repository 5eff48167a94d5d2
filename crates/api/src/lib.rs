//! Platform API client for Talentgate
//!
//! This crate talks to the platform backend: subscription state and
//! plan changes, per-feature usage counters, the activity log, and the
//! resume-processing endpoints. Requests are bearer-authenticated with
//! the access token of the signed-in user; the token is swapped in and
//! out as sessions come and go.

pub mod error;
pub mod fetch;
pub mod resume;
pub mod subscription;
pub mod usage;

use reqwest::Client;
use std::sync::{Arc, RwLock};

pub use error::ApiError;
pub use resume::ResumeApi;
pub use subscription::{SubscriptionApi, SubscriptionRecord, UpgradeResponse};
pub use usage::{IncrementResponse, UsageApi, UsageRecord};

/// The entry point for the platform API
///
/// # Example
///
/// ```no_run
/// use talentgate_api::ApiClient;
///
/// let api = ApiClient::new("https://backend.talentgate.app/api", reqwest::Client::new());
/// api.set_auth(Some("access-token".to_string()));
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: Client,
    bearer: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL, including the `/api` prefix
    /// * `http_client` - The shared HTTP client
    pub fn new(base_url: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            bearer: Arc::new(RwLock::new(None)),
        }
    }

    /// Set or clear the access token attached to every request.
    /// Clones of this client observe the change.
    pub fn set_auth(&self, token: Option<String>) {
        let mut guard = self.bearer.write().unwrap();
        *guard = token;
    }

    /// The access token currently attached to requests
    pub fn auth_token(&self) -> Option<String> {
        let guard = self.bearer.read().unwrap();
        guard.clone()
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Subscription endpoints
    pub fn subscription(&self) -> SubscriptionApi<'_> {
        SubscriptionApi::new(self)
    }

    /// Usage metering and activity-log endpoints
    pub fn usage(&self) -> UsageApi<'_> {
        UsageApi::new(self)
    }

    /// Resume-processing endpoints
    pub fn resume(&self) -> ResumeApi<'_> {
        ResumeApi::new(self)
    }
}
