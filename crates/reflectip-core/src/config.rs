//! Resolver configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `REFLECTIP_PROVIDERS` | all built-ins | Comma-separated registration order |
//! | `REFLECTIP_TIMEOUT_MS` | `3000` | Per-attempt timeout |
//! | `REFLECTIP_RETRIES` | `0` | Retries per provider on transport faults |
//! | `REFLECTIP_USER_AGENT` | `reflectip/<version>` | HTTP user agent |

use std::env;

use crate::error::ValidationError;
use crate::http_client::{header_value, DEFAULT_USER_AGENT};
use crate::retry::RetryConfig;
use crate::source::{parse_provider_list, ProviderId};

pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

const PROVIDERS_VAR: &str = "REFLECTIP_PROVIDERS";
const TIMEOUT_VAR: &str = "REFLECTIP_TIMEOUT_MS";
const RETRIES_VAR: &str = "REFLECTIP_RETRIES";
const USER_AGENT_VAR: &str = "REFLECTIP_USER_AGENT";

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub providers: Vec<ProviderId>,
    pub timeout_ms: u64,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            providers: ProviderId::ALL.to_vec(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryConfig::no_retry(),
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `REFLECTIP_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(PROVIDERS_VAR) {
            let providers = parse_provider_list(&value)?;
            if providers.is_empty() {
                return Err(ValidationError::InvalidConfig {
                    key: PROVIDERS_VAR,
                    value,
                    reason: "must name at least one provider",
                });
            }
            config.providers = providers;
        }

        if let Some(value) = lookup(TIMEOUT_VAR) {
            config.timeout_ms = match value.trim().parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => timeout_ms,
                _ => {
                    return Err(ValidationError::InvalidConfig {
                        key: TIMEOUT_VAR,
                        value,
                        reason: "expected a positive integer number of milliseconds",
                    })
                }
            };
        }

        if let Some(value) = lookup(RETRIES_VAR) {
            let retries = value
                .trim()
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidConfig {
                    key: RETRIES_VAR,
                    value: value.clone(),
                    reason: "expected a non-negative integer",
                })?;
            config.retry = RetryConfig::exponential(retries);
        }

        if let Some(value) = lookup(USER_AGENT_VAR) {
            let value = value.trim();
            if !value.is_empty() {
                header_value(USER_AGENT_VAR, value)?;
                config.user_agent = value.to_owned();
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let config = ResolverConfig::from_lookup(lookup_from(&[])).expect("defaults");
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.providers, ProviderId::ALL.to_vec());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ResolverConfig::from_lookup(lookup_from(&[
            ("REFLECTIP_PROVIDERS", "cloudflare,ip6me"),
            ("REFLECTIP_TIMEOUT_MS", "1500"),
            ("REFLECTIP_RETRIES", "2"),
            ("REFLECTIP_USER_AGENT", "uptime-monitor/1.0"),
        ]))
        .expect("valid config");

        assert_eq!(config.providers, vec![ProviderId::Cloudflare, ProviderId::Ip6Me]);
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.retry.max_retries, 2);
        assert!(config.retry.enabled);
        assert_eq!(config.user_agent, "uptime-monitor/1.0");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = ResolverConfig::from_lookup(lookup_from(&[("REFLECTIP_PROVIDERS", "ipify,nope")]))
            .expect_err("unknown provider");
        assert!(matches!(error, ValidationError::InvalidSource { .. }));
    }

    #[test]
    fn blank_provider_list_is_rejected() {
        let error = ResolverConfig::from_lookup(lookup_from(&[("REFLECTIP_PROVIDERS", " , ")]))
            .expect_err("empty list");
        assert!(matches!(error, ValidationError::InvalidConfig { key: "REFLECTIP_PROVIDERS", .. }));
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        for value in ["0", "-5", "soon"] {
            let error = ResolverConfig::from_lookup(lookup_from(&[("REFLECTIP_TIMEOUT_MS", value)]))
                .expect_err("invalid timeout");
            assert!(matches!(error, ValidationError::InvalidConfig { key: "REFLECTIP_TIMEOUT_MS", .. }));
        }
    }

    #[test]
    fn user_agent_that_is_not_a_header_value_is_rejected() {
        let error = ResolverConfig::from_lookup(lookup_from(&[("REFLECTIP_USER_AGENT", "bad\nagent")]))
            .expect_err("invalid user agent");

        assert!(matches!(
            error,
            ValidationError::InvalidConfig { key: "REFLECTIP_USER_AGENT", ref value, .. } if value == "bad\nagent"
        ));
    }

    #[test]
    fn blank_user_agent_keeps_the_default() {
        let config = ResolverConfig::from_lookup(lookup_from(&[("REFLECTIP_USER_AGENT", "   ")]))
            .expect("valid config");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
