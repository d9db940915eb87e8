use thiserror::Error;

use crate::http_client::HttpError;

/// Registration and configuration errors. These surface when a provider or
/// resolver is built, never during resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("endpoint '{value}' is not a valid absolute URI: {reason}")]
    MalformedEndpoint { value: String, reason: String },
    #[error("endpoint '{value}' must use https, found '{scheme}'")]
    InsecureEndpoint { value: String, scheme: String },

    #[error(
        "invalid source '{value}', expected one of ip6me, ipify, icanhazip, cloudflare, ipinfo"
    )]
    InvalidSource { value: String },
    #[error("invalid provider name '{value}': {reason}")]
    InvalidProviderName { value: String, reason: &'static str },

    #[error("config value {key}='{value}' is invalid: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("at least one reflection provider must be registered")]
    NoProviders,

    #[error("failed to build HTTP client: {reason}")]
    HttpClient { reason: String },
}

/// Failure while fetching or reading a provider response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport fault: {0}")]
    Transport(#[from] HttpError),
    #[error("operation was cancelled")]
    Cancelled,
}

