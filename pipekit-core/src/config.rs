//! Stage configuration

use std::time::Duration;

use crate::error::{Error, Result};
use crate::retryable::Retryable;

/// Configuration for a `retry_map` stage
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub retries: u32,

    /// Base delay; attempt `n` waits `backoff * 2^n` before the next try
    pub backoff: Duration,

    /// Failure kinds that trigger a retry
    pub retry_on: Retryable,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
            retry_on: Retryable::any(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `retries` retries with the default backoff
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Set the base backoff
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the retryable failure kinds
    #[must_use]
    pub fn retry_on(mut self, retry_on: Retryable) -> Self {
        self.retry_on = retry_on;
        self
    }
}

/// Throughput bound for a `rate_limit` stage: `rate` items per `per`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Items allowed per window
    pub rate: f64,

    /// Window length
    pub per: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            rate: 1.0,
            per: Duration::from_secs(1),
        }
    }
}

impl RateLimit {
    /// Create a new rate limit
    pub fn new(rate: f64, per: Duration) -> Self {
        Self { rate, per }
    }

    /// Minimum spacing between two released items
    pub fn interval(&self) -> Result<Duration> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(Error::config(format!(
                "rate must be a positive number, got {}",
                self.rate
            )));
        }

        Duration::try_from_secs_f64(self.per.as_secs_f64() / self.rate).map_err(|_| {
            Error::config(format!(
                "rate {} per {:?} gives an unrepresentable interval",
                self.rate, self.per
            ))
        })
    }
}
