//! Typed responses for each solver endpoint.
//!
//! The remote service reports identifiers as JSON numbers, but strings are
//! accepted as well; both are normalized to their string form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// `POST /login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    pub status: Option<String>,
    pub session: Option<String>,
    pub errormessage: Option<String>,
}

impl LoginResponse {
    pub fn into_session(self) -> AppResult<SessionToken> {
        match self.session {
            Some(session) if !session.trim().is_empty() => Ok(SessionToken(session)),
            _ => Err(AppError::auth(
                self.errormessage
                    .unwrap_or_else(|| "login response has no session".to_string()),
            )),
        }
    }
}

/// `POST /upload`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    pub status: Option<String>,
    pub subid: Option<Value>,
    pub errormessage: Option<String>,
}

impl UploadResponse {
    pub fn into_submission_id(self) -> AppResult<SubmissionId> {
        match self.subid.as_ref().and_then(id_from_value) {
            Some(id) => Ok(SubmissionId(id)),
            None => Err(AppError::upload(
                self.errormessage
                    .unwrap_or_else(|| "upload response has no subid".to_string()),
            )),
        }
    }
}

/// `GET /submissions/{subid}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub jobs: Vec<Value>,
}

impl SubmissionStatus {
    /// First assigned job; `null` placeholders mean the job is not created yet.
    pub fn first_job(&self) -> Option<JobId> {
        self.jobs.iter().find_map(id_from_value).map(JobId)
    }
}

/// `GET /jobs/{jobid}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatusResponse {
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Solving,
    Success,
    Failure,
    Unknown(String),
}

impl JobStatusResponse {
    pub fn job_status(&self) -> JobStatus {
        match self.status.as_deref() {
            Some("solving") => JobStatus::Solving,
            Some("success") => JobStatus::Success,
            Some("failure") => JobStatus::Failure,
            Some(other) => JobStatus::Unknown(other.to_string()),
            None => JobStatus::Unknown(String::new()),
        }
    }
}

/// Astrometric solution of a solved job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub job_id: JobId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CalibrationResult {
    pub fn new(job_id: JobId, fields: Map<String, Value>) -> Self {
        Self { job_id, fields }
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Right ascension of the field center, degrees.
    pub fn ra(&self) -> Option<f64> {
        self.number("ra")
    }

    /// Declination of the field center, degrees.
    pub fn dec(&self) -> Option<f64> {
        self.number("dec")
    }

    /// Field radius, degrees.
    pub fn radius(&self) -> Option<f64> {
        self.number("radius")
    }

    /// Arcseconds per pixel.
    pub fn pixscale(&self) -> Option<f64> {
        self.number("pixscale")
    }

    /// Degrees east of north.
    pub fn orientation(&self) -> Option<f64> {
        self.number("orientation")
    }

    pub fn parity(&self) -> Option<f64> {
        self.number("parity")
    }

    pub fn width_arcsec(&self) -> Option<f64> {
        self.number("width_arcsec")
    }

    pub fn height_arcsec(&self) -> Option<f64> {
        self.number("height_arcsec")
    }

    pub fn to_json(&self) -> AppResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
