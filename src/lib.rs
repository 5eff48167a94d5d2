//! Talentgate Client Core
//!
//! The client-side core of the Talentgate recruiting platform: session
//! management, subscription-tier resolution, per-feature usage metering
//! and the route guards that decide what a signed-in user may access.

pub mod auth;
pub mod boundary;
pub mod config;
pub mod error;
pub mod guard;
pub mod routes;
pub mod services;
pub mod store;
pub mod subscription;
pub mod usage;

use reqwest::Client;

use crate::auth::AuthCore;
use crate::boundary::SubscriptionBoundary;
use crate::config::ClientOptions;
use crate::services::Services;
use talentgate_api::ApiClient;
use talentgate_identity::{IdentityClient, IdentityOptions};

/// The main entry point for the Talentgate client
pub struct Talentgate {
    /// The base URL of the identity provider
    pub identity_url: String,
    /// The base URL of the backend API, including the `/api` prefix
    pub api_url: String,
    /// The anonymous API key for the identity provider
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    identity: IdentityClient,
    api: ApiClient,
    core: AuthCore,
}

impl Talentgate {
    /// Create a new Talentgate client
    ///
    /// # Arguments
    ///
    /// * `identity_url` - The base URL of the identity provider
    /// * `api_url` - The base URL of the backend API, including `/api`
    /// * `key` - The anonymous API key for the identity provider
    ///
    /// # Example
    ///
    /// ```
    /// use talentgate::Talentgate;
    ///
    /// let client = Talentgate::new(
    ///     "https://your-project.identity.example.com",
    ///     "https://app.example.com/api",
    ///     "your-anon-key",
    /// );
    /// ```
    pub fn new(identity_url: &str, api_url: &str, key: &str) -> Self {
        Self::new_with_options(identity_url, api_url, key, ClientOptions::default())
    }

    /// Create a new Talentgate client with custom options
    ///
    /// # Arguments
    ///
    /// * `identity_url` - The base URL of the identity provider
    /// * `api_url` - The base URL of the backend API, including `/api`
    /// * `key` - The anonymous API key for the identity provider
    /// * `options` - Custom client options
    ///
    /// # Example
    ///
    /// ```
    /// use talentgate::{Talentgate, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_persist_session(false);
    /// let client = Talentgate::new_with_options(
    ///     "https://your-project.identity.example.com",
    ///     "https://app.example.com/api",
    ///     "your-anon-key",
    ///     options,
    /// );
    /// ```
    pub fn new_with_options(
        identity_url: &str,
        api_url: &str,
        key: &str,
        options: ClientOptions,
    ) -> Self {
        let http_client = match options.request_timeout {
            Some(timeout) => Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            None => Client::new(),
        };

        let identity_options = IdentityOptions {
            persist_session: options.persist_session,
            auto_refresh_token: options.auto_refresh_token,
            cache_path: if options.persist_session {
                options.session_cache_path.clone()
            } else {
                None
            },
        };
        let identity =
            IdentityClient::new(identity_url, key, http_client.clone(), identity_options);
        let api = ApiClient::new(api_url, http_client.clone());
        let core = AuthCore::new(
            Services::over_http(identity.clone(), api.clone()),
            options.clone(),
        );

        Self {
            identity_url: identity_url.to_string(),
            api_url: api_url.to_string(),
            key: key.to_string(),
            http_client,
            options,
            identity,
            api,
            core,
        }
    }

    /// Get a reference to the auth core: sign-in, session restoration,
    /// subscription resolution, usage metering and the state store
    pub fn core(&self) -> &AuthCore {
        &self.core
    }

    /// Get a reference to the identity client for direct provider access
    pub fn identity(&self) -> &IdentityClient {
        &self.identity
    }

    /// Get a reference to the backend API client
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create the subscription error boundary configured for this client
    pub fn boundary(&self) -> SubscriptionBoundary {
        SubscriptionBoundary::new(self.options.support_email.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthCore, SignIn};
    pub use crate::boundary::{BoundaryView, SubscriptionBoundary};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::guard::{Guard, GuardOutcome};
    pub use crate::routes::{landing_route, Route};
    pub use crate::store::{
        AuthPhase, Notice, NoticeLevel, PlanTier, Session, StoreEvent, StoreSnapshot,
        SubscriptionStatus, UserRole,
    };
    pub use crate::usage::{Allowance, Feature, FeatureUsage, RecordedUse};
    pub use crate::Talentgate;
}
