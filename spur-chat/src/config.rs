use std::time::Duration;

use spur_types::RunMode;

use crate::error::ChatError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Tuning for a [`RunPoller`](crate::RunPoller)
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Delay between status queries; the first query happens one interval after start
    pub poll_interval: Duration,
    /// Give up after this many status queries. `None` polls until a terminal status.
    pub max_attempts: Option<u32>,
    /// Send earlier turns of the session as `message_history`
    pub send_history: bool,
    /// Most recent history entries kept per session
    pub history_limit: usize,
    pub run_mode: RunMode,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            send_history: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            run_mode: RunMode::Interactive,
        }
    }
}

impl PollerConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_history(mut self, send_history: bool, history_limit: usize) -> Self {
        self.send_history = send_history;
        self.history_limit = history_limit;
        self
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.poll_interval.is_zero() {
            return Err(ChatError::invalid_config("poll_interval must be greater than zero"));
        }
        if self.max_attempts == Some(0) {
            return Err(ChatError::invalid_config(
                "max_attempts must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_polls_every_second_without_bound() {
        let config = PollerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.run_mode, RunMode::Interactive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PollerConfig::default().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = PollerConfig::default().with_max_attempts(Some(0));
        assert!(config.validate().is_err());
        assert!(PollerConfig::default()
            .with_max_attempts(Some(3))
            .validate()
            .is_ok());
    }
}
