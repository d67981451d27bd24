use crate::errors::AppResult;

use super::job_poller::{poll_job, JobOutcome};
use super::retry::RetryBudget;
use super::submission_poller::poll_submission;
use super::types::{CalibrationResult, JobId, SubmissionId};
use super::uploader::upload_image;
use super::PlateSolverApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverSettings {
    pub submission: RetryBudget,
    pub job: RetryBudget,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            submission: RetryBudget::submission_default(),
            job: RetryBudget::job_default(),
        }
    }
}

/// How a solve attempt ended, short of a hard submission failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved {
        submission_id: SubmissionId,
        calibration: CalibrationResult,
    },
    SubmissionTimedOut {
        submission_id: SubmissionId,
    },
    JobTimedOut {
        submission_id: SubmissionId,
        job_id: JobId,
    },
    JobFailed {
        submission_id: SubmissionId,
        job_id: JobId,
    },
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved { .. })
    }

    pub fn submission_id(&self) -> &SubmissionId {
        match self {
            SolveOutcome::Solved { submission_id, .. }
            | SolveOutcome::SubmissionTimedOut { submission_id }
            | SolveOutcome::JobTimedOut { submission_id, .. }
            | SolveOutcome::JobFailed { submission_id, .. } => submission_id,
        }
    }
}

/// Upload an image and follow it to a terminal state.
///
/// `Err` is only returned for authentication or upload failures.
pub async fn solve_image<S: PlateSolverApi>(
    api: &S,
    api_key: &str,
    file_name: &str,
    image: &[u8],
    settings: &SolverSettings,
) -> AppResult<SolveOutcome> {
    let submission_id = upload_image(api, api_key, file_name, image).await?;

    let Some(job_id) = poll_submission(api, &submission_id, &settings.submission).await else {
        return Ok(SolveOutcome::SubmissionTimedOut { submission_id });
    };

    let outcome = match poll_job(api, &job_id, &settings.job).await {
        JobOutcome::Solved(calibration) => SolveOutcome::Solved {
            submission_id,
            calibration,
        },
        JobOutcome::Failed => SolveOutcome::JobFailed {
            submission_id,
            job_id,
        },
        JobOutcome::TimedOut => SolveOutcome::JobTimedOut {
            submission_id,
            job_id,
        },
    };

    Ok(outcome)
}
