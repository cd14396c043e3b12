use std::time::Duration;
use log::debug;

/// Reconnect backoff with bounded intervals
///
/// Uses 1s, 2s, 4s, 8s, 15s, 30s, 60s and then stays at 60s.
#[derive(Debug, Clone)]
pub struct RetryHandler {
    /// Current attempt number (0-based)
    attempt: usize,
    /// Maximum number of attempts before giving up
    max_attempts: Option<usize>,
    intervals: Vec<Duration>,
}

impl RetryHandler {
    /// Create a retry handler with the standard intervals for connection retries
    pub fn connection_retry() -> Self {
        let intervals = vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(15),
            Duration::from_secs(30),
            Duration::from_secs(60),
        ];
        Self::with_intervals(intervals)
    }

    /// Create a retry handler with custom intervals and no attempt limit
    pub fn with_intervals(intervals: Vec<Duration>) -> Self {
        Self {
            attempt: 0,
            max_attempts: None,
            intervals,
        }
    }

    /// Limit the number of attempts
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Get the current attempt number (0-based)
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Check if we should continue retrying
    pub fn should_retry(&self) -> bool {
        match self.max_attempts {
            Some(max) => self.attempt < max,
            None => true,
        }
    }

    /// Get the delay for the current attempt
    pub fn get_delay(&self) -> Duration {
        if self.intervals.is_empty() {
            return Duration::from_secs(0);
        }
        // Clamp to the last interval once the list is exhausted
        let index = std::cmp::min(self.attempt, self.intervals.len() - 1);
        self.intervals[index]
    }

    /// Delay to wait before the next attempt, advancing the counter
    ///
    /// Returns `None` once the attempt limit is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }
        let delay = self.get_delay();
        self.attempt += 1;
        debug!("Retry attempt {}: waiting {:?} before next attempt", self.attempt, delay);
        Some(delay)
    }

    /// Reset the retry counter
    pub fn reset(&mut self) {
        if self.attempt > 0 {
            debug!("Resetting retry counter");
        }
        self.attempt = 0;
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::connection_retry()
    }
}
