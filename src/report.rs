//! User-facing texts for solve results.
//!
//! All output is Telegram HTML.

use crate::solver::types::{CalibrationResult, JobId, SubmissionId};
use crate::solver::SolveOutcome;

pub const WELCOME_TEXT: &str = "<b>Astrometry bot</b>\n\
Send me a photo of the night sky and I will plate-solve it with astrometry.net.\n\n\
Supported formats: jpg, jpeg, png, bmp, tif, tiff (up to 10 MiB).\n\
Send the image as a file to avoid compression.";

pub const SEND_IMAGE_HINT: &str = "Please send an image of the sky. Use /help for details.";

pub const ACCEPTED_TEXT: &str =
    "Image received. Uploading to astrometry.net, solving usually takes a few minutes...";

pub const SUBMIT_FAILED_TEXT: &str =
    "Sorry, I could not submit your image to astrometry.net. Please try again later.";

pub const INTERNAL_ERROR_TEXT: &str = "Something went wrong while processing your image.";

pub fn annotated_image_url(site_url: &str, job_id: &JobId) -> String {
    format!("{}/annotated_display/{}", site_url, job_id)
}

pub fn status_page_url(site_url: &str, submission_id: &SubmissionId) -> String {
    format!("{}/status/{}", site_url, submission_id)
}

/// Right ascension in degrees as `HHh MMm SS.Ss`.
pub fn format_ra_hms(ra_deg: f64) -> String {
    let total_seconds = (ra_deg.rem_euclid(360.0) / 15.0) * 3600.0;
    // round to tenths first so 59.95s carries into the next minute
    let tenths = (total_seconds * 10.0).round() as u64 % (24 * 3600 * 10);
    let hours = tenths / 36000;
    let minutes = (tenths % 36000) / 600;
    let seconds = (tenths % 600) as f64 / 10.0;
    format!("{:02}h {:02}m {:04.1}s", hours, minutes, seconds)
}

/// Declination in degrees as `+DD° MM' SS"`.
pub fn format_dec_dms(dec_deg: f64) -> String {
    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let total_arcsec = (dec_deg.abs() * 3600.0).round() as u64;
    let degrees = total_arcsec / 3600;
    let minutes = (total_arcsec % 3600) / 60;
    let seconds = total_arcsec % 60;
    format!("{}{:02}° {:02}' {:02}\"", sign, degrees, minutes, seconds)
}

pub fn solved_caption(job_id: &JobId) -> String {
    format!("Solved! Annotated image for job <b>{}</b>", job_id)
}

pub fn format_calibration(
    calibration: &CalibrationResult,
    submission_id: &SubmissionId,
    site_url: &str,
) -> String {
    let mut lines = vec![format!("<b>Plate solution</b> (job {})", calibration.job_id)];

    if let Some(ra) = calibration.ra() {
        lines.push(format!("RA: {:.5}° ({})", ra, format_ra_hms(ra)));
    }
    if let Some(dec) = calibration.dec() {
        lines.push(format!("Dec: {:.5}° ({})", dec, format_dec_dms(dec)));
    }
    if let Some(radius) = calibration.radius() {
        lines.push(format!("Field radius: {:.3}°", radius));
    }
    if let (Some(width), Some(height)) = (calibration.width_arcsec(), calibration.height_arcsec())
    {
        lines.push(format!(
            "Field size: {:.1}' x {:.1}'",
            width / 60.0,
            height / 60.0
        ));
    }
    if let Some(pixscale) = calibration.pixscale() {
        lines.push(format!("Pixel scale: {:.3}\"/px", pixscale));
    }
    if let Some(orientation) = calibration.orientation() {
        lines.push(format!("Orientation: {:.2}° E of N", orientation));
    }
    if let Some(parity) = calibration.parity() {
        let label = if parity < 0.0 { "flipped" } else { "normal" };
        lines.push(format!("Parity: {}", label));
    }

    lines.push(format!(
        "Details: {}",
        status_page_url(site_url, submission_id)
    ));
    lines.join("\n")
}

/// Message for every outcome that is not a solution.
pub fn outcome_message(outcome: &SolveOutcome, site_url: &str) -> Option<String> {
    match outcome {
        SolveOutcome::Solved { .. } => None,
        SolveOutcome::SubmissionTimedOut { submission_id } => Some(format!(
            "astrometry.net accepted the image (submission {}) but did not start solving in time. \
             Please try again later.",
            submission_id
        )),
        SolveOutcome::JobTimedOut {
            submission_id,
            job_id,
        } => Some(format!(
            "Job {} is still running, I stopped waiting. You can follow it at {}",
            job_id,
            status_page_url(site_url, submission_id)
        )),
        SolveOutcome::JobFailed { job_id, .. } => Some(format!(
            "astrometry.net could not find a solution for this image (job {}). \
             Try a longer exposure or a less compressed file.",
            job_id
        )),
    }
}
