//! Platform-neutral event shapes handed to the moderation pipelines.
//!
//! Handlers translate raw gateway events into these before publishing them
//! on the bus, so the decision components never touch serenity types.

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// A posted or edited message eligible for content moderation
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEvent {
    pub chat_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    pub user_display_name: String,
    pub user_avatar_url: Option<String>,
    pub text: String,
    pub mention_count: usize,
    pub attachments: Vec<Attachment>,
    pub is_edit: bool,
}

/// A member joining a chat
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEvent {
    pub chat_id: u64,
    pub user_id: u64,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// An inline-button press
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    pub chat_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    pub custom_id: String,
}

/// Connection health changes, consumed by independent subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    Ready { bot_name: String },
    Resumed,
    ChatRemoved { chat_id: u64 },
}
