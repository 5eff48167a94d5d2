//! Error handling for the Talentgate client core

use crate::usage::Feature;
use std::fmt;
use talentgate_api::ApiError;
use talentgate_identity::IdentityError;
use thiserror::Error;

/// Unified error type for the Talentgate client core
#[derive(Error, Debug)]
pub enum Error {
    /// Identity provider errors (sign-up, sign-in, session refresh)
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Backend API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication errors raised by the core itself
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Subscription change errors (upgrade or cancel rejected)
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// A metered feature was invoked with its usage allowance exhausted
    #[error("Usage limit reached for {feature}: {message}")]
    LimitReached { feature: Feature, message: String },

    /// An operation that requires a signed-in user was called without one
    #[error("No active session")]
    MissingSession,

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new subscription error
    pub fn subscription<T: fmt::Display>(msg: T) -> Self {
        Error::Subscription(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}
