use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file type: {extension}. Supported formats are jpg, jpeg, png, bmp, tif and tiff.")]
    InvalidFileType { extension: String },

    #[error("File too large: {size} bytes. Maximum size is 10 MiB.")]
    FileTooLarge { size: u64 },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Rate limit exceeded. Retry after {retry_after_secs}s")]
    RateLimit { retry_after_secs: u64 },

    #[error("Authentication with the solver failed: {reason}")]
    Auth { reason: String },

    #[error("Upload to the solver failed: {reason}")]
    Upload { reason: String },

    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid_file_type(extension: &str) -> Self {
        Self::InvalidFileType {
            extension: extension.to_string(),
        }
    }

    pub fn file_too_large(size: u64) -> Self {
        Self::FileTooLarge { size }
    }

    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    pub fn upload(reason: impl Into<String>) -> Self {
        Self::Upload {
            reason: reason.into(),
        }
    }

    pub fn http_status(endpoint: &str, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.to_string(),
            status,
        }
    }

    /// Errors a poll loop swallows and retries on its next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::HttpStatus { .. }
                | AppError::Json(_)
                | AppError::Io(_)
        )
    }

    /// Errors raised before the pipeline runs; the user is told why and
    /// nothing is sent to the solver.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AppError::InvalidFileType { .. }
                | AppError::FileTooLarge { .. }
                | AppError::Validation { .. }
                | AppError::RateLimit { .. }
                | AppError::Image(_)
        )
    }

    /// Hard failures of the submission stage.
    pub fn is_submission_failure(&self) -> bool {
        matches!(self, AppError::Auth { .. } | AppError::Upload { .. })
    }
}
