use regex::Regex;
use std::path::Path;
use tokio::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::report;
use crate::security::{InputValidator, RateLimiter};
use crate::solver::{solve_image, PlateSolverApi, SolveOutcome, SolverSettings};
use crate::telegram::types::{ImageRef, Message, Update};
use crate::telegram::{FileStore, Notifier};

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub api_key: String,
    /// Web front-end of the solver (annotated images, status pages).
    pub site_url: String,
    pub solver: SolverSettings,
    pub rate_limit_window: Duration,
}

/// How a single inbound message was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    Ignored,
    Replied,
    Rejected(String),
    Finished(SolveOutcome),
    SubmitFailed(String),
    /// Something on our side broke (transport, disk); the user got a generic apology.
    Failed(String),
}

/// Message handler tying the transport, the solver and the replies together.
pub struct Bot<S, F, N> {
    solver: S,
    files: F,
    notifier: N,
    rate_limiter: RateLimiter,
    settings: BotSettings,
}

impl<S, F, N> Bot<S, F, N>
where
    S: PlateSolverApi,
    F: FileStore,
    N: Notifier,
{
    pub fn new(solver: S, files: F, notifier: N, settings: BotSettings) -> Self {
        Self {
            solver,
            files,
            notifier,
            rate_limiter: RateLimiter::new(settings.rate_limit_window),
            settings,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Entry point for one webhook delivery. Never fails: every error is
    /// logged and turned into a reply, so one bad image cannot affect others.
    pub async fn handle_update(&self, update: Update) -> HandleOutcome {
        let update_id = update.update_id;
        let Some(message) = update.into_message() else {
            log::debug!("Update {} carries no message, ignoring", update_id);
            return HandleOutcome::Ignored;
        };

        let chat_id = message.chat.id;
        match self.handle_message(&message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(
                    "Failed to handle update {} from chat {}: {}",
                    update_id,
                    chat_id,
                    e
                );
                self.reply(chat_id, report::INTERNAL_ERROR_TEXT).await;
                HandleOutcome::Failed(e.to_string())
            }
        }
    }

    async fn handle_message(&self, message: &Message) -> AppResult<HandleOutcome> {
        let chat_id = message.chat.id;

        if let Some(image) = ImageRef::from_message(message) {
            return self.handle_image(chat_id, image).await;
        }

        match message.text.as_deref().map(parse_command).transpose()? {
            Some(Some(command)) if command == "start" || command == "help" => {
                self.reply(chat_id, report::WELCOME_TEXT).await;
            }
            Some(_) => {
                self.reply(chat_id, report::SEND_IMAGE_HINT).await;
            }
            None => return Ok(HandleOutcome::Ignored),
        }

        Ok(HandleOutcome::Replied)
    }

    async fn handle_image(&self, chat_id: i64, image: ImageRef) -> AppResult<HandleOutcome> {
        log::info!(
            "Chat {} sent {} ({} bytes)",
            chat_id,
            image.file_name,
            image
                .file_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        // Nothing leaves the process until the image passes these checks
        let precheck = InputValidator::validate_extension(&image.extension)
            .and_then(|_| InputValidator::validate_size(image.file_size))
            .and_then(|_| self.rate_limiter.check_and_record(chat_id));

        if let Err(e) = precheck {
            log::info!("Rejected image from chat {}: {}", chat_id, e);
            self.reply(chat_id, &rejection_text(&e)).await;
            return Ok(HandleOutcome::Rejected(e.to_string()));
        }

        self.reply(chat_id, report::ACCEPTED_TEXT).await;

        match self.fetch_and_solve(&image).await {
            Ok(outcome) => {
                self.deliver(chat_id, &outcome).await;
                Ok(HandleOutcome::Finished(outcome))
            }
            Err(e) if e.is_permanent() => {
                log::info!("Downloaded file from chat {} rejected: {}", chat_id, e);
                self.reply(chat_id, &rejection_text(&e)).await;
                Ok(HandleOutcome::Rejected(e.to_string()))
            }
            Err(e) if e.is_submission_failure() => {
                log::error!("Submission for chat {} failed: {}", chat_id, e);
                self.reply(chat_id, report::SUBMIT_FAILED_TEXT).await;
                Ok(HandleOutcome::SubmitFailed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_and_solve(&self, image: &ImageRef) -> AppResult<SolveOutcome> {
        let url = self.files.resolve_file_url(&image.file_id).await?;
        let path = self.files.download(&url, &image.extension).await?;

        let result = self.solve_file(&path, &image.file_name).await;
        self.files.remove(&path).await;
        result
    }

    async fn solve_file(&self, path: &Path, file_name: &str) -> AppResult<SolveOutcome> {
        let (width, height) = InputValidator::validate_image_file(path)?;
        log::debug!("{} is a {}x{} image", file_name, width, height);

        let bytes = tokio::fs::read(path).await?;
        solve_image(
            &self.solver,
            &self.settings.api_key,
            file_name,
            &bytes,
            &self.settings.solver,
        )
        .await
    }

    async fn deliver(&self, chat_id: i64, outcome: &SolveOutcome) {
        let site_url = &self.settings.site_url;

        match outcome {
            SolveOutcome::Solved {
                submission_id,
                calibration,
            } => {
                log::info!(
                    "Chat {}: submission {} solved as job {}",
                    chat_id,
                    submission_id,
                    calibration.job_id
                );

                let photo_url = report::annotated_image_url(site_url, &calibration.job_id);
                let caption = report::solved_caption(&calibration.job_id);
                if let Err(e) = self.notifier.send_photo(chat_id, &photo_url, &caption).await {
                    // The report below still carries the result
                    log::warn!("Failed to send annotated image to chat {}: {}", chat_id, e);
                }

                let text = report::format_calibration(calibration, submission_id, site_url);
                self.reply(chat_id, &text).await;
            }
            other => {
                log::info!(
                    "Chat {}: submission {} ended without a solution: {:?}",
                    chat_id,
                    other.submission_id(),
                    other
                );
                if let Some(text) = report::outcome_message(other, site_url) {
                    self.reply(chat_id, &text).await;
                }
            }
        }
    }

    /// Delivery is best effort.
    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.notifier.send_text(chat_id, text).await {
            log::warn!("Failed to send message to chat {} (non-critical): {}", chat_id, e);
        }
    }
}

fn rejection_text(error: &AppError) -> String {
    match error {
        AppError::RateLimit { retry_after_secs } => format!(
            "You are sending images too quickly. Please wait {} seconds before the next one.",
            retry_after_secs
        ),
        AppError::InvalidFileType { extension } => format!(
            "Files of type .{} are not supported. Please send jpg, jpeg, png, bmp, tif or tiff.",
            extension
        ),
        AppError::FileTooLarge { .. } => {
            "This file is too large. The maximum size is 10 MiB.".to_string()
        }
        AppError::Image(_) => "This file does not look like a valid image.".to_string(),
        other => format!("This file cannot be processed: {}", other),
    }
}

/// `/cmd@botname args` -> `Some("cmd")`, plain text -> `None`.
fn parse_command(text: &str) -> AppResult<Option<String>> {
    let command_pattern = Regex::new(r"^/([A-Za-z0-9_]+)(?:@\w+)?(?:\s|$)")
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(command_pattern
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase()))
}
