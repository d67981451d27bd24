use super::retry::RetryBudget;
use super::types::{CalibrationResult, JobId, JobStatus};
use super::PlateSolverApi;

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Solved(CalibrationResult),
    /// The solver reported that no solution exists.
    Failed,
    TimedOut,
}

/// Poll `job` until it is solved, fails, or the budget runs out.
///
/// Status is re-queried from scratch every attempt, so a failed calibration
/// fetch after `success` is simply retried on the next cycle.
pub async fn poll_job<S: PlateSolverApi>(api: &S, job: &JobId, budget: &RetryBudget) -> JobOutcome {
    for attempt in budget.attempts() {
        match api.job_status(job).await {
            Ok(response) => match response.job_status() {
                JobStatus::Solving => {
                    log::debug!(
                        "Job {} still solving (attempt {}/{})",
                        job,
                        attempt,
                        budget.max_attempts
                    );
                }
                JobStatus::Success => match api.calibration(job).await {
                    Ok(fields) => {
                        log::info!("Job {} solved on attempt {}", job, attempt);
                        return JobOutcome::Solved(CalibrationResult::new(job.clone(), fields));
                    }
                    Err(e) => budget.log_failure("Calibration", job, attempt, &e),
                },
                JobStatus::Failure => {
                    log::info!("Job {} failed to solve (attempt {})", job, attempt);
                    return JobOutcome::Failed;
                }
                JobStatus::Unknown(status) => {
                    log::warn!(
                        "Job {} reported unrecognized status '{}' (attempt {}/{}), still polling",
                        job,
                        status,
                        attempt,
                        budget.max_attempts
                    );
                }
            },
            Err(e) => budget.log_failure("Job", job, attempt, &e),
        }

        budget.wait_after(attempt).await;
    }

    log::warn!(
        "Job {} did not finish after {} attempts",
        job,
        budget.max_attempts
    );
    JobOutcome::TimedOut
}
