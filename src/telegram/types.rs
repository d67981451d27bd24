use serde::{Deserialize, Serialize};

use crate::security::InputValidator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
}

impl Update {
    pub fn into_message(self) -> Option<Message> {
        self.message.or(self.edited_message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

/// `getFile` result
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

/// Envelope of every Bot API reply
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// An image attached to a message, as far as the envelope describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub file_id: String,
    pub file_size: Option<u64>,
    /// Lowercase, without the dot. Empty when it cannot be determined.
    pub extension: String,
    pub file_name: String,
}

impl ImageRef {
    pub fn from_message(message: &Message) -> Option<Self> {
        if let Some(document) = &message.document {
            let extension = document
                .file_name
                .as_deref()
                .and_then(InputValidator::extension_of)
                .or_else(|| {
                    document
                        .mime_type
                        .as_deref()
                        .and_then(extension_from_mime)
                        .map(str::to_string)
                })
                .unwrap_or_default();

            let file_name = document
                .file_name
                .clone()
                .unwrap_or_else(|| format!("{}.{}", document.file_id, extension));

            return Some(Self {
                file_id: document.file_id.clone(),
                file_size: document.file_size,
                extension,
                file_name,
            });
        }

        // Telegram re-encodes compressed photos as JPEG; take the largest size
        let photo = message
            .photo
            .as_ref()?
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))?;

        Some(Self {
            file_id: photo.file_id.clone(),
            file_size: photo.file_size,
            extension: "jpg".to_string(),
            file_name: format!("photo_{}.jpg", message.message_id),
        })
    }
}

fn extension_from_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/bmp" | "image/x-ms-bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        _ => None,
    }
}
