//! Service interfaces the core depends on.
//!
//! The core talks to the identity provider and the backend API through
//! these traits rather than concrete clients, so flow logic can be tested
//! against in-memory fakes. [`Services`] bundles one implementation of
//! each; [`Services::over_http`] wires up the real clients.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use talentgate_api::{
    ApiClient, ApiError, IncrementResponse, SubscriptionRecord, UpgradeResponse, UsageRecord,
};
use talentgate_identity::{
    AuthChange, IdentityClient, IdentityError, ProviderSession, SignUpOutcome,
};
use tokio::sync::broadcast;

/// Identity provider operations used by the core.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_type: &str,
    ) -> Result<SignUpOutcome, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str)
        -> Result<ProviderSession, IdentityError>;

    /// Recovers a previously persisted session, refreshing it if expired.
    async fn restore(&self) -> Result<Option<ProviderSession>, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Stream of session changes originating at the provider.
    fn changes(&self) -> broadcast::Receiver<AuthChange>;
}

/// Subscription endpoints used by the core.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn current(&self) -> Result<Option<SubscriptionRecord>, ApiError>;
    async fn upgrade(&self, subscription_type: &str) -> Result<UpgradeResponse, ApiError>;
    async fn cancel(&self) -> Result<(), ApiError>;
}

/// Usage-metering endpoints used by the core.
#[async_trait]
pub trait UsageService: Send + Sync {
    async fn get(&self, user_id: &str, feature: &str) -> Result<UsageRecord, ApiError>;
    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, UsageRecord>, ApiError>;
    async fn increment(&self, user_id: &str, feature: &str)
        -> Result<IncrementResponse, ApiError>;
    async fn reset(&self, user_id: &str, feature: &str) -> Result<(), ApiError>;
}

/// Best-effort activity trail. The acting user is identified by the
/// bearer token, not an explicit id.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn log(&self, action_type: &str, description: &str) -> Result<(), ApiError>;
}

/// Receives the access token whenever the session changes, so outgoing
/// API requests carry the current bearer.
pub trait AccessTokenSink: Send + Sync {
    fn set_access_token(&self, token: Option<String>);
}

/// A sink for cores that have no API client to keep authorized.
pub struct NoTokenSink;

impl AccessTokenSink for NoTokenSink {
    fn set_access_token(&self, _token: Option<String>) {}
}

#[async_trait]
impl IdentityService for IdentityClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_type: &str,
    ) -> Result<SignUpOutcome, IdentityError> {
        IdentityClient::sign_up(self, email, password, user_type).await
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        self.sign_in_with_password(email, password).await
    }

    async fn restore(&self) -> Result<Option<ProviderSession>, IdentityError> {
        self.current_session().await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        IdentityClient::sign_out(self).await
    }

    fn changes(&self) -> broadcast::Receiver<AuthChange> {
        self.on_auth_state_change()
    }
}

#[async_trait]
impl SubscriptionService for ApiClient {
    async fn current(&self) -> Result<Option<SubscriptionRecord>, ApiError> {
        self.subscription().current().await
    }

    async fn upgrade(&self, subscription_type: &str) -> Result<UpgradeResponse, ApiError> {
        self.subscription().upgrade(subscription_type).await
    }

    async fn cancel(&self) -> Result<(), ApiError> {
        self.subscription().cancel().await
    }
}

#[async_trait]
impl UsageService for ApiClient {
    async fn get(&self, user_id: &str, feature: &str) -> Result<UsageRecord, ApiError> {
        self.usage().get(user_id, feature).await
    }

    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, UsageRecord>, ApiError> {
        self.usage().get_all(user_id).await
    }

    async fn increment(
        &self,
        user_id: &str,
        feature: &str,
    ) -> Result<IncrementResponse, ApiError> {
        self.usage().increment(user_id, feature).await
    }

    async fn reset(&self, user_id: &str, feature: &str) -> Result<(), ApiError> {
        self.usage().reset(user_id, feature).await
    }
}

#[async_trait]
impl ActivityLog for ApiClient {
    async fn log(&self, action_type: &str, description: &str) -> Result<(), ApiError> {
        self.usage().log_activity(action_type, description).await
    }
}

impl AccessTokenSink for ApiClient {
    fn set_access_token(&self, token: Option<String>) {
        self.set_auth(token);
    }
}

/// One implementation of every service the core needs.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityService>,
    pub subscription: Arc<dyn SubscriptionService>,
    pub usage: Arc<dyn UsageService>,
    pub activity: Arc<dyn ActivityLog>,
    pub token_sink: Arc<dyn AccessTokenSink>,
}

impl Services {
    /// Wires every service to the real HTTP clients. The API client doubles
    /// as the token sink so bearer headers track the session.
    pub fn over_http(identity: IdentityClient, api: ApiClient) -> Services {
        let api = Arc::new(api);
        Services {
            identity: Arc::new(identity),
            subscription: api.clone(),
            usage: api.clone(),
            activity: api.clone(),
            token_sink: api,
        }
    }
}
