//! Configuration types for the sms-retriever crate
//!
//! Controls how often a failed broker start is retried, how long to wait
//! between attempts, and which broadcast action carries the result.

use std::time::Duration;

use crate::error::ConfigError;

/// Broadcast action the platform uses for retriever results
pub const SMS_RETRIEVED_ACTION: &str = "com.google.android.gms.auth.api.phone.SMS_RETRIEVED";

/// Configuration for retrieval sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverConfig {
    /// Total broker start attempts per session, first call included
    /// Default: 3
    pub max_start_attempts: u32,

    /// Delay before the second attempt; doubled for each later one
    /// Default: 1 second
    pub base_backoff: Duration,

    /// Upper bound for a single backoff delay
    /// Default: 10 seconds
    pub max_backoff: Duration,

    /// How long the broker watches for a message before reporting a timeout.
    /// The broker enforces this itself; kept here for diagnostics.
    /// Default: 5 minutes
    pub retrieval_window: Duration,

    /// Broadcast action the session's receiver is registered for
    /// Default: [`SMS_RETRIEVED_ACTION`]
    pub action: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            max_start_attempts: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            retrieval_window: Duration::from_secs(300),
            action: SMS_RETRIEVED_ACTION.to_string(),
        }
    }
}

impl RetrieverConfig {
    /// Create a new RetrieverConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Short backoff, for interactive flows where the user is waiting on screen
    pub fn fast_retry() -> Self {
        Self {
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_start_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    ///
    /// `base × attempt`, capped at `max_backoff`. Attempt 0 is treated as 1.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(attempt.max(1))
            .min(self.max_backoff)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_start_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }

        if self.base_backoff > self.max_backoff {
            return Err(ConfigError::InvalidBackoff {
                base_ms: self.base_backoff.as_millis(),
                max_ms: self.max_backoff.as_millis(),
            });
        }

        if self.retrieval_window == Duration::ZERO {
            return Err(ConfigError::EmptyWindow);
        }

        if self.action.trim().is_empty() {
            return Err(ConfigError::EmptyAction);
        }

        Ok(())
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_start_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    pub fn with_retrieval_window(mut self, window: Duration) -> Self {
        self.retrieval_window = window;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetrieverConfig::default();
        assert_eq!(config.max_start_attempts, 3);
        assert_eq!(config.action, SMS_RETRIEVED_ACTION);
        assert_eq!(config.retrieval_window, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetrieverConfig::new()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));

        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(300));
        assert_eq!(config.backoff_for(4), Duration::from_millis(350));
        assert_eq!(config.backoff_for(40), Duration::from_millis(350));
        assert_eq!(config.backoff_for(u32::MAX), Duration::from_millis(350));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            RetrieverConfig::new().with_max_attempts(0).validate(),
            Err(ConfigError::NoAttempts)
        );

        let inverted = RetrieverConfig::new()
            .with_backoff(Duration::from_secs(5), Duration::from_secs(1));
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvalidBackoff { .. })
        ));

        assert_eq!(
            RetrieverConfig::new().with_action("  ").validate(),
            Err(ConfigError::EmptyAction)
        );

        assert_eq!(
            RetrieverConfig::new()
                .with_retrieval_window(Duration::ZERO)
                .validate(),
            Err(ConfigError::EmptyWindow)
        );
    }

    #[test]
    fn test_config_presets() {
        let fast = RetrieverConfig::fast_retry();
        assert_eq!(fast.base_backoff, Duration::from_millis(100));
        assert!(fast.validate().is_ok());

        let single = RetrieverConfig::no_retry();
        assert_eq!(single.max_start_attempts, 1);
        assert!(single.validate().is_ok());
    }
}
