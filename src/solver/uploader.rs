use crate::errors::{AppError, AppResult};

use super::types::SubmissionId;
use super::PlateSolverApi;

/// Authenticate and submit one image, returning its submission id.
///
/// A fresh session is obtained for every call. Login problems surface as
/// [`AppError::Auth`] and stop before anything is uploaded; upload problems
/// surface as [`AppError::Upload`].
pub async fn upload_image<S: PlateSolverApi>(
    api: &S,
    api_key: &str,
    file_name: &str,
    image: &[u8],
) -> AppResult<SubmissionId> {
    let session = match api.login(api_key).await {
        Ok(response) => response.into_session()?,
        Err(e @ AppError::Auth { .. }) => return Err(e),
        Err(e) => return Err(AppError::auth(e.to_string())),
    };
    log::info!("Authenticated with solver, uploading {}", file_name);

    let submission = match api.upload(&session, file_name, image).await {
        Ok(response) => response.into_submission_id()?,
        Err(e @ AppError::Upload { .. }) => return Err(e),
        Err(e) => return Err(AppError::upload(e.to_string())),
    };

    log::info!(
        "Uploaded {} ({} bytes) as submission {}",
        file_name,
        image.len(),
        submission
    );
    Ok(submission)
}
