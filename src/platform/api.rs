use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Chat-platform failures, classified by what the caller can do about them.
///
/// `Blocked` is the "recipient blocked delivery" class: the send can never
/// succeed directly and fallback/queue stages may run. Everything else is
/// surfaced as `Platform` and left to the caller's error policy.
#[derive(Error, Debug)]
pub enum ChatApiError {
    #[error("recipient blocked direct delivery")]
    Blocked,

    #[error("chat platform error: {0}")]
    Platform(String),
}

/// A chat administrator as seen by the impersonation detector
#[derive(Debug, Clone)]
pub struct AdminProfile {
    pub user_id: u64,
    pub display_name: String,
    pub photo_path: Option<PathBuf>,
}

/// The member being scored against the roster
#[derive(Debug, Clone)]
pub struct MemberProfile {
    pub user_id: u64,
    pub display_name: String,
    pub photo_path: Option<PathBuf>,
}

/// One inline button attached to an admin alert
#[derive(Debug, Clone)]
pub struct AlertAction {
    pub label: String,
    pub custom_id: String,
    pub danger: bool,
}

/// The opaque remote-call surface of the chat platform.
///
/// All decision components speak this trait; the serenity adapter in
/// `platform::discord` is the only implementation wired in production.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Returns the platform message id on success
    async fn send_direct_message(&self, user_id: u64, text: &str) -> Result<u64, ChatApiError>;

    async fn send_direct_photo(
        &self,
        user_id: u64,
        path: &Path,
        caption: &str,
    ) -> Result<u64, ChatApiError>;

    async fn send_direct_video(
        &self,
        user_id: u64,
        path: &Path,
        caption: &str,
    ) -> Result<u64, ChatApiError>;

    async fn send_channel_message(&self, channel_id: u64, text: &str)
        -> Result<u64, ChatApiError>;

    async fn send_alert_with_actions(
        &self,
        channel_id: u64,
        text: &str,
        actions: &[AlertAction],
    ) -> Result<u64, ChatApiError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ChatApiError>;

    async fn ban_member(&self, chat_id: u64, user_id: u64, reason: &str)
        -> Result<(), ChatApiError>;

    async fn is_member_admin(&self, chat_id: u64, user_id: u64) -> Result<bool, ChatApiError>;

    /// Chats the bot currently serves, for cache reconciliation
    async fn list_joined_chats(&self) -> Result<Vec<u64>, ChatApiError>;
}

/// Administrator roster source for impersonation scoring. Separate from
/// `ChatApi` because listing the roster materializes admin photos, which is
/// far more expensive than a point-in-time admin check.
#[async_trait]
pub trait AdminRoster: Send + Sync {
    async fn list_admins(&self, chat_id: u64) -> Result<Vec<AdminProfile>, ChatApiError>;
}
