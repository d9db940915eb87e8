//! Per-provider retry of transport faults, with exponential backoff and jitter.
//!
//! Retries happen before the resolver falls back to the next provider. An
//! absent result is an answer, not a fault, and is never retried.

use std::time::Duration;

use crate::http_client::{HttpError, HttpErrorKind};

/// Backoff strategy between attempts against the same provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Delay is `base * factor^attempt`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = base.as_secs_f64() * factor.powi(exponent);
                let capped = Duration::try_from_secs_f64(seconds.min(max.as_secs_f64()).max(0.0))
                    .unwrap_or(max);

                if !jitter {
                    return capped;
                }

                let capped_ms = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
                let spread = capped_ms / 2;
                let offset = fastrand::u64(0..=spread * 2);
                Duration::from_millis((capped_ms - spread).saturating_add(offset))
            }
        }
    }
}

/// Retry policy for transport faults against a single provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Total attempts per provider = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    /// HTTP status codes that trigger a retry.
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    /// Retries are off; the resolver moves straight to the next provider.
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryConfig {
    /// Exponential backoff with `max_retries` retries per provider.
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            enabled: max_retries > 0,
            max_retries,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            backoff: Backoff::Fixed { delay },
            ..Self::exponential(max_retries)
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            ..Self::exponential(0)
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Whether retry number `attempt` (0-based) may follow `error`.
    pub fn should_retry(&self, error: &HttpError, attempt: u32) -> bool {
        if !self.enabled || attempt >= self.max_retries {
            return false;
        }

        match error.kind() {
            HttpErrorKind::Status(status) => self.should_retry_status(status),
            HttpErrorKind::Timeout => self.retry_on_timeout,
            HttpErrorKind::Connect => self.retry_on_connect,
            HttpErrorKind::Body | HttpErrorKind::Request => error.retryable(),
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
