#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use serde_json::{json, Map, Value};

use astrometry_bot::errors::{AppError, AppResult};
use astrometry_bot::handler::{Bot, BotSettings};
use astrometry_bot::security::FileSystemGuard;
use astrometry_bot::solver::retry::RetryBudget;
use astrometry_bot::solver::types::{
    JobId, JobStatusResponse, LoginResponse, SessionToken, SubmissionId, SubmissionStatus,
    UploadResponse,
};
use astrometry_bot::solver::{PlateSolverApi, SolverSettings};
use astrometry_bot::telegram::types::Update;
use astrometry_bot::telegram::{FileStore, Notifier};
use tokio::time::Duration;

pub const SITE: &str = "http://nova.astrometry.net";

/// One scripted remote reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    HttpError(u16),
}

impl Reply {
    fn decode<T: serde::de::DeserializeOwned>(self, endpoint: &str) -> AppResult<T> {
        match self {
            Reply::Json(value) => Ok(serde_json::from_value(value)?),
            Reply::HttpError(status) => Err(AppError::http_status(endpoint, status)),
        }
    }
}

#[derive(Debug, Default)]
pub struct CallCounts {
    pub login: AtomicU32,
    pub upload: AtomicU32,
    pub submission: AtomicU32,
    pub job: AtomicU32,
    pub calibration: AtomicU32,
}

impl CallCounts {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

/// Solver that replays queued replies in order. Exhausted queues fall back
/// to "no job yet", "solving" and a failed calibration fetch.
pub struct ScriptedSolver {
    login: Reply,
    upload: Reply,
    submissions: Mutex<VecDeque<Reply>>,
    jobs: Mutex<VecDeque<Reply>>,
    calibrations: Mutex<VecDeque<Reply>>,
    pub calls: CallCounts,
}

impl ScriptedSolver {
    pub fn new() -> Self {
        Self {
            login: Reply::Json(json!({"status": "success", "session": "session-token"})),
            upload: Reply::Json(json!({"status": "success", "subid": 1001})),
            submissions: Mutex::new(VecDeque::new()),
            jobs: Mutex::new(VecDeque::new()),
            calibrations: Mutex::new(VecDeque::new()),
            calls: CallCounts::default(),
        }
    }

    pub fn with_login(mut self, reply: Reply) -> Self {
        self.login = reply;
        self
    }

    pub fn with_upload(mut self, reply: Reply) -> Self {
        self.upload = reply;
        self
    }

    pub fn with_submissions(self, replies: Vec<Reply>) -> Self {
        self.submissions.lock().unwrap().extend(replies);
        self
    }

    pub fn with_job_statuses(self, statuses: &[&str]) -> Self {
        self.jobs
            .lock()
            .unwrap()
            .extend(statuses.iter().map(|s| Reply::Json(json!({ "status": s }))));
        self
    }

    pub fn with_job_replies(self, replies: Vec<Reply>) -> Self {
        self.jobs.lock().unwrap().extend(replies);
        self
    }

    pub fn with_calibrations(self, replies: Vec<Reply>) -> Self {
        self.calibrations.lock().unwrap().extend(replies);
        self
    }

    fn next(queue: &Mutex<VecDeque<Reply>>, fallback: Reply) -> Reply {
        queue.lock().unwrap().pop_front().unwrap_or(fallback)
    }
}

pub fn no_job() -> Reply {
    Reply::Json(json!({"jobs": []}))
}

pub fn pending_job() -> Reply {
    Reply::Json(json!({"jobs": [null]}))
}

pub fn assigned_job(id: u64) -> Reply {
    Reply::Json(json!({"jobs": [id]}))
}

pub fn calibration() -> Reply {
    Reply::Json(json!({
        "ra": 83.822,
        "dec": -5.391,
        "radius": 1.1,
        "pixscale": 3.2,
        "orientation": 90.5,
        "parity": 1.0
    }))
}

impl PlateSolverApi for ScriptedSolver {
    async fn login(&self, _api_key: &str) -> AppResult<LoginResponse> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        self.login.clone().decode("login")
    }

    async fn upload(
        &self,
        _session: &SessionToken,
        _file_name: &str,
        _image: &[u8],
    ) -> AppResult<UploadResponse> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        self.upload.clone().decode("upload")
    }

    async fn submission_status(&self, _submission: &SubmissionId) -> AppResult<SubmissionStatus> {
        self.calls.submission.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.submissions, no_job()).decode("submissions")
    }

    async fn job_status(&self, _job: &JobId) -> AppResult<JobStatusResponse> {
        self.calls.job.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.jobs, Reply::Json(json!({"status": "solving"}))).decode("jobs")
    }

    async fn calibration(&self, _job: &JobId) -> AppResult<Map<String, Value>> {
        self.calls.calibration.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.calibrations, Reply::HttpError(500)).decode("calibration")
    }
}

/// Solver keyed by uploaded file name, so concurrent pipelines can be told
/// apart. Each submission needs one empty poll before its job shows up.
#[derive(Default)]
pub struct KeyedSolver {
    submission_polls: Mutex<HashMap<String, u32>>,
    pub calls: CallCounts,
}

impl PlateSolverApi for KeyedSolver {
    async fn login(&self, api_key: &str) -> AppResult<LoginResponse> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_value(json!({ "session": format!("session-{}", api_key) }))?)
    }

    async fn upload(
        &self,
        _session: &SessionToken,
        file_name: &str,
        _image: &[u8],
    ) -> AppResult<UploadResponse> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_value(json!({ "subid": format!("sub-{}", file_name) }))?)
    }

    async fn submission_status(&self, submission: &SubmissionId) -> AppResult<SubmissionStatus> {
        self.calls.submission.fetch_add(1, Ordering::SeqCst);
        let polls = {
            let mut map = self.submission_polls.lock().unwrap();
            let count = map.entry(submission.0.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let jobs = if polls >= 2 {
            json!([submission.0.replacen("sub-", "job-", 1)])
        } else {
            json!([null])
        };
        Ok(serde_json::from_value(json!({ "jobs": jobs }))?)
    }

    async fn job_status(&self, _job: &JobId) -> AppResult<JobStatusResponse> {
        self.calls.job.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_value(json!({"status": "success"}))?)
    }

    async fn calibration(&self, job: &JobId) -> AppResult<Map<String, Value>> {
        self.calls.calibration.fetch_add(1, Ordering::SeqCst);
        let value = json!({ "ra": 10.0, "dec": 20.0, "source_job": job.0 });
        Ok(value.as_object().cloned().unwrap_or_default())
    }
}

/// File store that "downloads" a freshly generated image.
#[derive(Default)]
pub struct MemoryFileStore {
    pub resolves: AtomicU32,
    pub downloads: AtomicU32,
    pub removes: AtomicU32,
    /// Write garbage instead of an image.
    pub corrupt: bool,
    /// Fail every `getFile` lookup as if Telegram were down.
    pub offline: bool,
    downloaded: Mutex<Vec<PathBuf>>,
}

impl MemoryFileStore {
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn downloaded_paths(&self) -> Vec<PathBuf> {
        self.downloaded.lock().unwrap().clone()
    }
}

impl FileStore for MemoryFileStore {
    async fn resolve_file_url(&self, file_id: &str) -> AppResult<String> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(AppError::Telegram("getFile: connection refused".to_string()));
        }
        Ok(format!("memory://{}", file_id))
    }

    async fn download(&self, _url: &str, extension: &str) -> AppResult<PathBuf> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let path = FileSystemGuard::create_secure_temp_file("png")?;

        if self.corrupt {
            std::fs::write(&path, b"this is not an image")?;
        } else {
            image::RgbImage::new(8, 6).save(&path)?;
        }

        log::debug!("Fake download for .{} stored at {}", extension, path.display());
        self.downloaded.lock().unwrap().push(path.clone());
        Ok(path)
    }

    async fn remove(&self, path: &Path) {
        self.removes.fetch_add(1, Ordering::SeqCst);
        FileSystemGuard::remove_temp_file(path).await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(i64, String),
    Photo(i64, String, String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(id, text) if id == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn photos_for(&self, chat_id: i64) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Photo(id, url, caption) if id == chat_id => Some((url, caption)),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Photo(chat_id, photo_url.to_string(), caption.to_string()));
        Ok(())
    }
}

pub fn fast_settings() -> SolverSettings {
    SolverSettings {
        submission: RetryBudget::new(5, Duration::from_secs(5)),
        job: RetryBudget::new(5, Duration::from_secs(10)),
    }
}

pub fn bot_settings() -> BotSettings {
    BotSettings {
        api_key: "test-key".to_string(),
        site_url: SITE.to_string(),
        solver: fast_settings(),
        rate_limit_window: Duration::from_secs(3600),
    }
}

pub fn test_bot<S: PlateSolverApi>(
    solver: S,
    files: MemoryFileStore,
) -> Bot<S, MemoryFileStore, RecordingNotifier> {
    Bot::new(solver, files, RecordingNotifier::default(), bot_settings())
}

pub fn document_update(update_id: i64, chat_id: i64, file_name: &str, size: u64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "chat": {"id": chat_id, "type": "private"},
            "document": {
                "file_id": format!("file-{}", update_id),
                "file_name": file_name,
                "file_size": size
            }
        }
    }))
    .unwrap()
}

pub fn photo_update(update_id: i64, chat_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "chat": {"id": chat_id, "type": "private"},
            "photo": [
                {"file_id": "thumb", "file_unique_id": "t", "width": 90, "height": 60, "file_size": 900},
                {"file_id": format!("photo-{}", update_id), "file_unique_id": "p", "width": 1280, "height": 960, "file_size": 150000}
            ]
        }
    }))
    .unwrap()
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "chat": {"id": chat_id, "type": "private"},
            "text": text
        }
    }))
    .unwrap()
}
