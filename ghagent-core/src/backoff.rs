//! Polling backoff for job submission.
//!
//! The create command polls the job resource until a pull request
//! materializes. Delays grow geometrically up to an interval cap and
//! stop once the elapsed budget is spent. Elapsed time is accounted by
//! the delays handed out rather than a wall clock, which keeps the
//! schedule fully deterministic under test.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollBackoff {
    multiplier: f64,
    max_interval: Duration,
    max_elapsed: Duration,
    max_attempts: Option<u32>,

    next: Duration,
    elapsed: Duration,
    attempts: u32,
}

impl PollBackoff {
    pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(300);
    pub const DEFAULT_MULTIPLIER: f64 = 1.5;
    pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        Self::with_policy(
            Self::DEFAULT_INITIAL_INTERVAL,
            Self::DEFAULT_MULTIPLIER,
            Self::DEFAULT_MAX_INTERVAL,
            Self::DEFAULT_MAX_ELAPSED,
        )
    }

    pub fn with_policy(
        initial: Duration,
        multiplier: f64,
        max_interval: Duration,
        max_elapsed: Duration,
    ) -> Self {
        Self {
            multiplier,
            max_interval,
            max_elapsed,
            max_attempts: None,
            next: initial,
            elapsed: Duration::ZERO,
            attempts: 0,
        }
    }

    /// Cap the number of delays handed out. Used by tests that need a
    /// bounded schedule independent of durations.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// The next wait interval, or None once the budget is spent.
    ///
    /// Intervals are monotonically non-decreasing until the interval
    /// cap, then constant.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if self.attempts >= max {
                return None;
            }
        }

        let delay = self.next;
        if self.elapsed + delay > self.max_elapsed {
            return None;
        }

        self.elapsed += delay;
        self.attempts += 1;
        self.next = std::cmp::min(delay.mul_f64(self.multiplier), self.max_interval);
        Some(delay)
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new()
    }
}
