use std::fmt::Display;

use tokio::time::{sleep, Duration};

use crate::errors::AppError;

/// Attempt budget for one polling stage.
///
/// The delay is uniform on purpose: it tracks the solver's known latency,
/// so there is no exponential growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Job assignment usually happens within seconds.
    pub fn submission_default() -> Self {
        Self::new(12, Duration::from_secs(5))
    }

    /// Solving itself takes minutes.
    pub fn job_default() -> Self {
        Self::new(60, Duration::from_secs(10))
    }

    pub fn attempts(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.max_attempts
    }

    pub fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Sleep before the next attempt; a no-op after the final one.
    pub async fn wait_after(&self, attempt: u32) {
        if !self.is_last(attempt) {
            sleep(self.delay).await;
        }
    }

    /// Log a failed attempt. Transient failures are expected while polling;
    /// anything else still uses up the attempt but is logged as an error.
    pub fn log_failure(&self, stage: &str, id: &dyn Display, attempt: u32, error: &AppError) {
        log::log!(
            failure_level(error),
            "{} poll attempt {}/{} failed for {}: {}",
            stage,
            attempt,
            self.max_attempts,
            id,
            error
        );
    }
}

fn failure_level(error: &AppError) -> log::Level {
    if error.is_retryable() {
        log::Level::Warn
    } else {
        log::Level::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_defaults_keep_job_stage_slower() {
        let submission = RetryBudget::submission_default();
        let job = RetryBudget::job_default();
        assert!(job.delay > submission.delay);
        assert!(job.max_attempts > submission.max_attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_skips_final_attempt() {
        let budget = RetryBudget::new(3, Duration::from_secs(2));
        let start = Instant::now();

        for attempt in budget.attempts() {
            budget.wait_after(attempt).await;
        }

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[test]
    fn test_failure_level() {
        assert_eq!(
            failure_level(&AppError::http_status("jobs/7", 503)),
            log::Level::Warn
        );
        assert_eq!(
            failure_level(&AppError::Internal("lock poisoned".to_string())),
            log::Level::Error
        );
    }

    #[test]
    fn test_zero_budget() {
        let budget = RetryBudget::new(0, Duration::from_secs(1));
        assert_eq!(budget.attempts().count(), 0);
        assert!(budget.is_last(0));
    }
}
