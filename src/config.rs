//! Configuration options for the Talentgate client

use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for the Talentgate client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to automatically refresh an expired access token
    pub auto_refresh_token: bool,

    /// Whether to persist the session to disk between runs
    pub persist_session: bool,

    /// Where the persisted session is cached; `None` disables persistence
    /// even when `persist_session` is set
    pub session_cache_path: Option<PathBuf>,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Address offered by the subscription error screen's contact action
    pub support_email: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            session_cache_path: default_cache_path(),
            request_timeout: Some(Duration::from_secs(30)),
            support_email: "support@talentgate.app".to_string(),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set where the session is cached
    pub fn with_session_cache_path(mut self, value: Option<PathBuf>) -> Self {
        self.session_cache_path = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the support contact address
    pub fn with_support_email(mut self, value: &str) -> Self {
        self.support_email = value.to_string();
        self
    }
}

fn default_cache_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".talentgate")
            .join("session.json")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let options = ClientOptions::default()
            .with_persist_session(false)
            .with_request_timeout(None)
            .with_support_email("help@example.com");
        assert!(!options.persist_session);
        assert!(options.request_timeout.is_none());
        assert_eq!(options.support_email, "help@example.com");
        assert!(options.auto_refresh_token);
    }
}
