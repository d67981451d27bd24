// Plate solving module - drives an image through the remote solver
//
// upload -> submission poll -> job poll -> calibration

pub mod astrometry_client;
pub mod job_poller;
pub mod pipeline;
pub mod retry;
pub mod submission_poller;
pub mod types;
pub mod uploader;

use serde_json::{Map, Value};

use crate::errors::AppResult;
use types::{
    JobId, JobStatusResponse, LoginResponse, SessionToken, SubmissionId, SubmissionStatus,
    UploadResponse,
};

pub use astrometry_client::AstrometryClient;
pub use job_poller::{poll_job, JobOutcome};
pub use pipeline::{solve_image, SolveOutcome, SolverSettings};
pub use submission_poller::poll_submission;
pub use uploader::upload_image;

/// The remote plate-solving endpoints, one call per method.
///
/// Implementations only move bytes and decode the per-endpoint response;
/// deciding what a response means is left to the pipeline stages.
#[allow(async_fn_in_trait)]
pub trait PlateSolverApi {
    async fn login(&self, api_key: &str) -> AppResult<LoginResponse>;

    async fn upload(
        &self,
        session: &SessionToken,
        file_name: &str,
        image: &[u8],
    ) -> AppResult<UploadResponse>;

    async fn submission_status(&self, submission: &SubmissionId) -> AppResult<SubmissionStatus>;

    async fn job_status(&self, job: &JobId) -> AppResult<JobStatusResponse>;

    async fn calibration(&self, job: &JobId) -> AppResult<Map<String, Value>>;
}
