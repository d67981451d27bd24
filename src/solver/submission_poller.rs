use super::retry::RetryBudget;
use super::types::{JobId, SubmissionId};
use super::PlateSolverApi;

/// Wait for the solver to assign a job to `submission`.
///
/// Query failures count as "no job yet" and use up an attempt. Returns
/// `None` once the budget is spent.
pub async fn poll_submission<S: PlateSolverApi>(
    api: &S,
    submission: &SubmissionId,
    budget: &RetryBudget,
) -> Option<JobId> {
    for attempt in budget.attempts() {
        match api.submission_status(submission).await {
            Ok(status) => {
                if let Some(job) = status.first_job() {
                    log::info!(
                        "Submission {} assigned job {} (attempt {}/{})",
                        submission,
                        job,
                        attempt,
                        budget.max_attempts
                    );
                    return Some(job);
                }
                log::debug!(
                    "Submission {} has no job yet (attempt {}/{})",
                    submission,
                    attempt,
                    budget.max_attempts
                );
            }
            Err(e) => budget.log_failure("Submission", submission, attempt, &e),
        }

        budget.wait_after(attempt).await;
    }

    log::warn!(
        "Submission {} got no job after {} attempts",
        submission,
        budget.max_attempts
    );
    None
}
