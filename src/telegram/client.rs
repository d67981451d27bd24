use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::security::{FileSystemGuard, InputValidator};

use super::types::{ApiResponse, TelegramFile};
use super::{FileStore, Notifier};

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> AppResult<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    /// URLs embed the bot token; never log them verbatim.
    fn redact(&self, text: &str) -> String {
        text.replace(&self.token, "<token>")
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> AppResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Telegram(self.redact(&e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Telegram(self.redact(&e.to_string())))?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            AppError::Telegram(format!(
                "{} returned HTTP {} with unreadable body: {}",
                method, status, e
            ))
        })?;

        if !parsed.ok {
            return Err(AppError::Telegram(format!(
                "{} failed: {}",
                method,
                parsed.description.unwrap_or_else(|| status.to_string())
            )));
        }

        parsed
            .result
            .ok_or_else(|| AppError::Telegram(format!("{} returned no result", method)))
    }

    pub async fn get_file(&self, file_id: &str) -> AppResult<TelegramFile> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Register the public webhook URL with Telegram.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> AppResult<()> {
        let mut payload = json!({
            "url": url,
            "allowed_updates": ["message", "edited_message"],
        });
        if let Some(secret) = secret {
            payload["secret_token"] = json!(secret);
        }

        let _: bool = self.call("setWebhook", &payload).await?;
        log::info!("Registered webhook {}", url);
        Ok(())
    }
}

impl FileStore for TelegramClient {
    async fn resolve_file_url(&self, file_id: &str) -> AppResult<String> {
        let file = self.get_file(file_id).await?;

        let file_path = file.file_path.ok_or_else(|| {
            AppError::Telegram(format!("File {} is not available for download", file.file_id))
        })?;

        // The extension Telegram stored may differ from the announced one
        if let Some(extension) = InputValidator::extension_of(&file_path) {
            InputValidator::validate_extension(&extension)?;
        }
        InputValidator::validate_size(file.file_size)?;

        Ok(self.file_url(&file_path))
    }

    async fn download(&self, url: &str, extension: &str) -> AppResult<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Telegram(self.redact(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status("file download", status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Telegram(self.redact(&e.to_string())))?;
        InputValidator::validate_size(Some(bytes.len() as u64))?;

        let path = FileSystemGuard::create_secure_temp_file(extension)?;
        tokio::fs::write(&path, &bytes).await?;

        log::debug!("Downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    async fn remove(&self, path: &Path) {
        FileSystemGuard::remove_temp_file(path).await;
    }
}

impl Notifier for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let _: Value = self.call("sendMessage", &payload).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> AppResult<()> {
        let payload = json!({
            "chat_id": chat_id,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": "HTML",
        });

        let _: Value = self.call("sendPhoto", &payload).await?;
        Ok(())
    }
}
