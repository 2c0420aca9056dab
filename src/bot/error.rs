use thiserror::Error;

use crate::platform::api::ChatApiError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Chat platform error: {0}")]
    ChatApi(#[from] ChatApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    #[error("Critical scanner '{scanner}' failed: {message}")]
    CriticalScan {
        scanner: &'static str,
        message: String,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Error::Custom(msg.into())
    }
}
