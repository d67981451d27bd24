use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::errors::{AppError, AppResult};

/// Largest image accepted for solving.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

const TEMP_DIR_NAME: &str = "astrometry_bot_secure";

pub struct InputValidator;

impl InputValidator {
    pub fn validate_extension(extension: &str) -> AppResult<()> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();

        if ext.is_empty() {
            return Err(AppError::validation("file", "File must have an extension"));
        }

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::invalid_file_type(&ext));
        }

        Ok(())
    }

    /// Unknown sizes pass here and are checked again once the file is on disk.
    pub fn validate_size(size: Option<u64>) -> AppResult<()> {
        match size {
            Some(size) if size > MAX_FILE_SIZE => Err(AppError::file_too_large(size)),
            _ => Ok(()),
        }
    }

    pub fn extension_of(file_name: &str) -> Option<String> {
        Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Check a downloaded file before it is sent anywhere. Returns the image dimensions.
    pub fn validate_image_file(path: &Path) -> AppResult<(u32, u32)> {
        let size = FileSystemGuard::get_file_size(path)?;
        Self::validate_size(Some(size))?;

        // Only the header is decoded
        let dimensions = image::image_dimensions(path)?;
        Ok(dimensions)
    }
}

/// Per-chat submission throttle shared by all in-flight requests.
pub struct RateLimiter {
    window: Duration,
    last_accepted: Mutex<HashMap<i64, Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Accept and record a request from `chat_id` in one step.
    pub fn check_and_record(&self, chat_id: i64) -> AppResult<()> {
        let mut last_accepted = self
            .last_accepted
            .lock()
            .map_err(|e| AppError::Internal(format!("Rate limiter lock poisoned: {}", e)))?;

        let now = Instant::now();
        if let Some(&previous) = last_accepted.get(&chat_id) {
            let elapsed = now.duration_since(previous);
            if elapsed < self.window {
                let remaining = self.window - elapsed;
                return Err(AppError::RateLimit {
                    retry_after_secs: remaining.as_secs().max(1),
                });
            }
        }

        if last_accepted.len() >= 1024 {
            let window = self.window;
            last_accepted.retain(|_, accepted| now.duration_since(*accepted) < window);
        }

        last_accepted.insert(chat_id, now);
        Ok(())
    }
}

// File system security utilities
pub struct FileSystemGuard;

impl FileSystemGuard {
    pub fn temp_directory() -> AppResult<PathBuf> {
        let temp_dir = std::env::temp_dir().join(TEMP_DIR_NAME);
        std::fs::create_dir_all(&temp_dir)?;
        Ok(temp_dir)
    }

    pub fn create_secure_temp_file(extension: &str) -> AppResult<PathBuf> {
        let temp_dir = Self::temp_directory()?;

        // Never reuse the user's file name on disk
        let random_name = uuid::Uuid::new_v4().to_string();
        let extension = if extension.is_empty() { "tmp" } else { extension };

        Ok(temp_dir.join(format!("{}.{}", random_name, extension)))
    }

    /// Best-effort removal; failures are logged, never raised.
    pub async fn remove_temp_file(path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => log::debug!("Removed temp file {}", path.display()),
            Err(e) => log::warn!("Failed to remove temp file {}: {}", path.display(), e),
        }
    }

    pub fn cleanup_temp_files() -> AppResult<()> {
        let temp_dir = std::env::temp_dir().join(TEMP_DIR_NAME);
        if temp_dir.exists() {
            std::fs::remove_dir_all(&temp_dir)?;
        }
        Ok(())
    }

    pub fn get_file_size(path: &Path) -> AppResult<u64> {
        let metadata = std::fs::metadata(path)?;
        Ok(metadata.len())
    }
}
