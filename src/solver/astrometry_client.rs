use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Duration;

use crate::errors::{AppError, AppResult};

use super::types::{
    JobId, JobStatusResponse, LoginResponse, SessionToken, SubmissionId, SubmissionStatus,
    UploadResponse,
};
use super::PlateSolverApi;

/// astrometry.net (nova) API client
pub struct AstrometryClient {
    client: Client,
    base_url: String,
}

impl AstrometryClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = self.endpoint(path);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        parse_response(path, response).await
    }
}

async fn parse_response<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::debug!(
            "Solver error body for {} (first 300 chars): {}",
            endpoint,
            error_text.chars().take(300).collect::<String>()
        );
        return Err(AppError::http_status(endpoint, status.as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

impl PlateSolverApi for AstrometryClient {
    async fn login(&self, api_key: &str) -> AppResult<LoginResponse> {
        let request_json = serde_json::json!({ "apikey": api_key }).to_string();

        let response = self
            .client
            .post(self.endpoint("login"))
            .form(&[("request-json", request_json)])
            .send()
            .await?;

        parse_response("login", response).await
    }

    async fn upload(
        &self,
        session: &SessionToken,
        file_name: &str,
        image: &[u8],
    ) -> AppResult<UploadResponse> {
        let form = UploadPayload::new(session, file_name, image)?.build_form()?;
        log::debug!("Uploading {} ({} bytes)", file_name, image.len());

        // Every part has a known size, so reqwest sends an exact
        // Content-Length instead of a chunked body
        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        parse_response("upload", response).await
    }

    async fn submission_status(&self, submission: &SubmissionId) -> AppResult<SubmissionStatus> {
        self.get_json(&format!("submissions/{}", submission)).await
    }

    async fn job_status(&self, job: &JobId) -> AppResult<JobStatusResponse> {
        self.get_json(&format!("jobs/{}", job)).await
    }

    async fn calibration(&self, job: &JobId) -> AppResult<Map<String, Value>> {
        self.get_json(&format!("jobs/{}/calibration", job)).await
    }
}

/// Field order matches what the solver's reference client sends.
#[derive(Debug, Serialize)]
struct UploadSettings<'a> {
    publicly_visible: &'a str,
    allow_modifications: &'a str,
    session: &'a str,
    allow_commercial_use: &'a str,
}

/// Form fields for `POST /upload`
#[derive(Debug, Clone)]
pub struct UploadPayload {
    request_json: String,
    file_name: String,
    data: Vec<u8>,
}

impl UploadPayload {
    pub fn new(session: &SessionToken, file_name: &str, image: &[u8]) -> AppResult<Self> {
        let settings = UploadSettings {
            publicly_visible: "n",
            allow_modifications: "d",
            session: &session.0,
            allow_commercial_use: "d",
        };

        Ok(Self {
            request_json: serde_json::to_string(&settings)?,
            file_name: file_name.to_string(),
            data: image.to_vec(),
        })
    }

    pub fn request_json(&self) -> &str {
        &self.request_json
    }

    pub fn build_form(&self) -> AppResult<multipart::Form> {
        let file = multipart::Part::bytes(self.data.clone())
            .file_name(self.file_name.clone())
            .mime_str("application/octet-stream")?;

        Ok(multipart::Form::new()
            .text("request-json", self.request_json.clone())
            .part("file", file))
    }
}
