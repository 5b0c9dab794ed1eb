//! Retry policies with exponential backoff for transient provider failures.
//!
//! ```text
//! delay = initial_interval × (backoff_factor ^ attempt)
//! delay = min(delay, max_interval)
//! if jitter: delay *= random(0.5..=1.5)
//! ```
//!
//! Only errors classified by [`LlmError::is_retryable`] are retried;
//! authentication failures and malformed responses surface immediately.
//!
//! ```rust
//! use llm::RetryPolicy;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_initial_interval(1.0)
//!     .with_backoff_factor(2.0)
//!     .with_jitter(false);
//!
//! assert!(policy.should_retry(2));
//! assert!(!policy.should_retry(3));
//! assert_eq!(policy.calculate_delay(1).as_secs(), 2);
//! ```

use crate::error::{LlmError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retrying failed model calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: usize,

    /// Initial interval between retries in seconds
    pub initial_interval: f64,

    /// Multiplier for the interval after each retry
    pub backoff_factor: f64,

    /// Maximum interval between retries in seconds
    pub max_interval: f64,

    /// Whether to add random jitter to intervals
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a new retry policy with the given max attempts
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 30.0,
            jitter: true,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Set the initial interval between retries
    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    /// Set the backoff factor
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum interval between retries
    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        if attempt >= self.max_attempts {
            return Duration::from_secs(0);
        }

        let base_delay = self.initial_interval * self.backoff_factor.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_interval).max(0.0);

        let final_delay = if self.jitter {
            let mut rng = rand::thread_rng();
            let jitter_factor = rng.gen_range(0.5..=1.5);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }

    /// Check if another attempt is allowed after `attempt` attempts
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Execute a model call under a retry policy.
///
/// `label` identifies the call in logs. The last error is returned when the
/// policy is exhausted or the error is not retryable.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.calculate_delay(attempt - 1);
            debug!(
                call = %label,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(call = %label, attempt = attempt + 1, "Retry succeeded");
                }
                return Ok(value);
            }
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() {
                    return Err(err);
                }
                if attempt >= max_attempts {
                    warn!(
                        call = %label,
                        attempts = attempt,
                        error = %err,
                        "Model call failed, retries exhausted"
                    );
                    return Err(err);
                }
                warn!(
                    call = %label,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %err,
                    "Model call failed, will retry"
                );
            }
        }
    }
}

/// Reject policies that cannot make a single attempt.
pub fn validate(policy: &RetryPolicy) -> Result<()> {
    if policy.max_attempts == 0 {
        return Err(LlmError::ConfigError(
            "retry max_attempts must be at least 1".to_string(),
        ));
    }
    if policy.initial_interval < 0.0 || policy.max_interval < 0.0 || policy.backoff_factor < 1.0 {
        return Err(LlmError::ConfigError(
            "retry intervals must be non-negative and backoff_factor >= 1.0".to_string(),
        ));
    }
    Ok(())
}
