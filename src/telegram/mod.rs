// Telegram Bot API collaborators - file access and outbound messages

pub mod client;
pub mod types;

use std::path::{Path, PathBuf};

use crate::errors::AppResult;

pub use client::TelegramClient;

/// Where user images come from and where they are kept while solving.
#[allow(async_fn_in_trait)]
pub trait FileStore {
    /// Resolve a transport file id to a downloadable URL.
    async fn resolve_file_url(&self, file_id: &str) -> AppResult<String>;

    /// Fetch `url` into a fresh temporary file with the given extension.
    async fn download(&self, url: &str, extension: &str) -> AppResult<PathBuf>;

    /// Best-effort removal of a downloaded file.
    async fn remove(&self, path: &Path);
}

/// Outbound messages to a chat.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Text is sent with HTML formatting enabled.
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()>;

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> AppResult<()>;
}
