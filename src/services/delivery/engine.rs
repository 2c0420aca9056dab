use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::bot::error::Error;
use crate::db::models::QueuedNotification;
use crate::db::queries::{member_stats, notification};
use crate::platform::api::{ChatApi, ChatApiError};
use crate::services::scheduler::{JobScheduler, ScheduledJob};

/// What a notification is about, recorded with queued entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Moderation,
    Impersonation,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Moderation => "moderation",
            NotificationKind::Impersonation => "impersonation",
            NotificationKind::System => "system",
        }
    }
}

/// Outcome of one delivery attempt.
///
/// `Queued` means the notification survived, but callers must treat it as a
/// failure for immediate feedback purposes: the user has not seen anything
/// yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { message_id: u64 },
    DeliveredViaFallback { message_id: u64 },
    Queued,
    Failed,
}

impl DeliveryResult {
    /// Whether the text actually reached the user right now
    pub fn reached_user(&self) -> bool {
        matches!(
            self,
            DeliveryResult::Delivered { .. } | DeliveryResult::DeliveredViaFallback { .. }
        )
    }
}

/// Persistence surface for deferred notifications and the per-user
/// "can-receive-direct-messages" flag
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn enqueue(
        &self,
        user_id: u64,
        kind: NotificationKind,
        body: &str,
        photo_path: Option<&Path>,
        video_path: Option<&Path>,
    ) -> Result<Uuid, Error>;

    async fn pending_for(&self, user_id: u64) -> Result<Vec<QueuedNotification>, Error>;

    async fn list_undelivered(&self, limit: i64) -> Result<Vec<QueuedNotification>, Error>;

    async fn mark_delivered(&self, id: Uuid) -> Result<(), Error>;

    async fn set_dm_capability(&self, user_id: u64, can_receive: bool) -> Result<(), Error>;
}

pub struct PgDeliveryStore {
    pool: PgPool,
}

impl PgDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStore for PgDeliveryStore {
    async fn enqueue(
        &self,
        user_id: u64,
        kind: NotificationKind,
        body: &str,
        photo_path: Option<&Path>,
        video_path: Option<&Path>,
    ) -> Result<Uuid, Error> {
        Ok(notification::enqueue(
            &self.pool,
            user_id as i64,
            kind.as_str(),
            body,
            photo_path.and_then(|p| p.to_str()),
            video_path.and_then(|p| p.to_str()),
        )
        .await?)
    }

    async fn pending_for(&self, user_id: u64) -> Result<Vec<QueuedNotification>, Error> {
        Ok(notification::pending_for_user(&self.pool, user_id as i64).await?)
    }

    async fn list_undelivered(&self, limit: i64) -> Result<Vec<QueuedNotification>, Error> {
        Ok(notification::list_undelivered(&self.pool, limit).await?)
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<(), Error> {
        Ok(notification::mark_delivered(&self.pool, id).await?)
    }

    async fn set_dm_capability(&self, user_id: u64, can_receive: bool) -> Result<(), Error> {
        Ok(member_stats::set_dm_capability(&self.pool, user_id as i64, can_receive).await?)
    }
}

/// Direct-message delivery with fallback-to-channel and deferred retry.
///
/// Stage order per attempt: direct send, then (depending on the entry point)
/// either an in-channel fallback post or a queue entry. Later stages run only
/// when the direct send failed because the recipient blocked delivery; any
/// other platform failure propagates to the caller untouched.
pub struct DeliveryEngine {
    api: Arc<dyn ChatApi>,
    scheduler: Arc<dyn JobScheduler>,
    store: Arc<dyn DeliveryStore>,
}

impl DeliveryEngine {
    pub fn new(
        api: Arc<dyn ChatApi>,
        scheduler: Arc<dyn JobScheduler>,
        store: Arc<dyn DeliveryStore>,
    ) -> Self {
        Self {
            api,
            scheduler,
            store,
        }
    }

    /// Direct message, falling back to an in-channel post when the recipient
    /// has blocked the bot. A fallback post can be scheduled for deletion
    /// after `auto_delete_seconds`.
    pub async fn send_direct(
        &self,
        user_id: u64,
        text: &str,
        fallback_chat_id: Option<u64>,
        auto_delete_seconds: Option<u64>,
    ) -> Result<DeliveryResult, Error> {
        match self.api.send_direct_message(user_id, text).await {
            Ok(message_id) => {
                self.note_dm_capability(user_id, true).await;
                Ok(DeliveryResult::Delivered { message_id })
            }
            Err(ChatApiError::Blocked) => {
                self.note_dm_capability(user_id, false).await;

                let Some(channel_id) = fallback_chat_id else {
                    debug!(
                        "Direct delivery to user {} blocked and no fallback chat given",
                        user_id
                    );
                    return Ok(DeliveryResult::Failed);
                };

                let message_id = self.api.send_channel_message(channel_id, text).await?;

                if let Some(seconds) = auto_delete_seconds {
                    self.scheduler
                        .schedule(
                            Duration::from_secs(seconds),
                            ScheduledJob::DeleteMessage {
                                channel_id,
                                message_id,
                            },
                        )
                        .await?;
                }

                Ok(DeliveryResult::DeliveredViaFallback { message_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Direct message that is persisted for redelivery instead of posted
    /// in-channel when the recipient has blocked the bot
    pub async fn send_with_queue(
        &self,
        user_id: u64,
        kind: NotificationKind,
        text: &str,
    ) -> Result<DeliveryResult, Error> {
        match self.api.send_direct_message(user_id, text).await {
            Ok(message_id) => {
                self.note_dm_capability(user_id, true).await;
                Ok(DeliveryResult::Delivered { message_id })
            }
            Err(ChatApiError::Blocked) => {
                self.note_dm_capability(user_id, false).await;
                let id = self.store.enqueue(user_id, kind, text, None, None).await?;
                debug!(
                    "Queued notification {} for user {} after blocked delivery",
                    id, user_id
                );
                Ok(DeliveryResult::Queued)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like `send_with_queue`, with the text used as a caption when media is
    /// attached
    pub async fn send_with_media(
        &self,
        user_id: u64,
        kind: NotificationKind,
        text: &str,
        photo_path: Option<&Path>,
        video_path: Option<&Path>,
    ) -> Result<DeliveryResult, Error> {
        let attempt = if let Some(photo) = photo_path {
            self.api.send_direct_photo(user_id, photo, text).await
        } else if let Some(video) = video_path {
            self.api.send_direct_video(user_id, video, text).await
        } else {
            self.api.send_direct_message(user_id, text).await
        };

        match attempt {
            Ok(message_id) => {
                self.note_dm_capability(user_id, true).await;
                Ok(DeliveryResult::Delivered { message_id })
            }
            Err(ChatApiError::Blocked) => {
                self.note_dm_capability(user_id, false).await;
                self.store
                    .enqueue(user_id, kind, text, photo_path, video_path)
                    .await?;
                Ok(DeliveryResult::Queued)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bookkeeping side effect on every direct attempt; a failed flag write
    /// must not fail an otherwise successful delivery
    async fn note_dm_capability(&self, user_id: u64, can_receive: bool) {
        if let Err(e) = self.store.set_dm_capability(user_id, can_receive).await {
            warn!(
                "Could not record dm capability for user {}: {:?}",
                user_id, e
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::platform::api::{AdminProfile, AlertAction};

    /// Records every platform call; direct sends can be switched to fail as
    /// blocked
    #[derive(Default)]
    pub struct RecordingChatApi {
        pub dm_blocked: Mutex<bool>,
        pub direct_messages: Mutex<Vec<(u64, String)>>,
        pub channel_messages: Mutex<Vec<(u64, String)>>,
        pub deleted: Mutex<Vec<(u64, u64)>>,
        pub banned: Mutex<Vec<(u64, u64, String)>>,
        pub alerts: Mutex<Vec<(u64, String, Vec<String>)>>,
        pub media: Mutex<Vec<(u64, PathBuf, String)>>,
    }

    impl RecordingChatApi {
        pub fn blocked() -> Self {
            let api = Self::default();
            *api.dm_blocked.lock().unwrap() = true;
            api
        }
    }

    #[async_trait]
    impl ChatApi for RecordingChatApi {
        async fn send_direct_message(
            &self,
            user_id: u64,
            text: &str,
        ) -> Result<u64, ChatApiError> {
            if *self.dm_blocked.lock().unwrap() {
                return Err(ChatApiError::Blocked);
            }
            let mut sent = self.direct_messages.lock().unwrap();
            sent.push((user_id, text.to_string()));
            Ok(1000 + sent.len() as u64)
        }

        async fn send_direct_photo(
            &self,
            user_id: u64,
            path: &Path,
            caption: &str,
        ) -> Result<u64, ChatApiError> {
            if *self.dm_blocked.lock().unwrap() {
                return Err(ChatApiError::Blocked);
            }
            let mut sent = self.media.lock().unwrap();
            sent.push((user_id, path.to_owned(), caption.to_string()));
            Ok(2000 + sent.len() as u64)
        }

        async fn send_direct_video(
            &self,
            user_id: u64,
            path: &Path,
            caption: &str,
        ) -> Result<u64, ChatApiError> {
            self.send_direct_photo(user_id, path, caption).await
        }

        async fn send_channel_message(
            &self,
            channel_id: u64,
            text: &str,
        ) -> Result<u64, ChatApiError> {
            let mut sent = self.channel_messages.lock().unwrap();
            sent.push((channel_id, text.to_string()));
            Ok(3000 + sent.len() as u64)
        }

        async fn send_alert_with_actions(
            &self,
            channel_id: u64,
            text: &str,
            actions: &[AlertAction],
        ) -> Result<u64, ChatApiError> {
            self.alerts.lock().unwrap().push((
                channel_id,
                text.to_string(),
                actions.iter().map(|a| a.custom_id.clone()).collect(),
            ));
            Ok(4000)
        }

        async fn delete_message(
            &self,
            channel_id: u64,
            message_id: u64,
        ) -> Result<(), ChatApiError> {
            self.deleted.lock().unwrap().push((channel_id, message_id));
            Ok(())
        }

        async fn ban_member(
            &self,
            chat_id: u64,
            user_id: u64,
            reason: &str,
        ) -> Result<(), ChatApiError> {
            self.banned
                .lock()
                .unwrap()
                .push((chat_id, user_id, reason.to_string()));
            Ok(())
        }

        async fn is_member_admin(&self, _chat_id: u64, _user_id: u64) -> Result<bool, ChatApiError> {
            Ok(false)
        }

        async fn list_joined_chats(&self) -> Result<Vec<u64>, ChatApiError> {
            Ok(vec![])
        }
    }

    /// In-memory store mirroring the Postgres-backed one
    #[derive(Default)]
    pub struct MemoryStore {
        pub entries: Mutex<Vec<QueuedNotification>>,
        pub dm_flags: Mutex<HashMap<u64, bool>>,
    }

    #[async_trait]
    impl DeliveryStore for MemoryStore {
        async fn enqueue(
            &self,
            user_id: u64,
            kind: NotificationKind,
            body: &str,
            photo_path: Option<&Path>,
            video_path: Option<&Path>,
        ) -> Result<Uuid, Error> {
            let id = Uuid::new_v4();
            self.entries.lock().unwrap().push(QueuedNotification {
                id,
                user_id: user_id as i64,
                kind: kind.as_str().to_string(),
                body: body.to_string(),
                photo_path: photo_path.map(|p| p.to_string_lossy().into_owned()),
                video_path: video_path.map(|p| p.to_string_lossy().into_owned()),
                created_at: Utc::now(),
                delivered_at: None,
            });
            Ok(id)
        }

        async fn pending_for(&self, user_id: u64) -> Result<Vec<QueuedNotification>, Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id as i64 && e.delivered_at.is_none())
                .cloned()
                .collect())
        }

        async fn list_undelivered(&self, limit: i64) -> Result<Vec<QueuedNotification>, Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.delivered_at.is_none())
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn mark_delivered(&self, id: Uuid) -> Result<(), Error> {
            for entry in self.entries.lock().unwrap().iter_mut() {
                if entry.id == id {
                    entry.delivered_at = Some(Utc::now());
                }
            }
            Ok(())
        }

        async fn set_dm_capability(&self, user_id: u64, can_receive: bool) -> Result<(), Error> {
            self.dm_flags.lock().unwrap().insert(user_id, can_receive);
            Ok(())
        }
    }

    /// Captures scheduled jobs instead of running them
    #[derive(Default)]
    pub struct RecordingScheduler {
        pub jobs: Mutex<Vec<(Duration, ScheduledJob)>>,
    }

    #[async_trait]
    impl JobScheduler for RecordingScheduler {
        async fn schedule(&self, delay: Duration, job: ScheduledJob) -> Result<(), Error> {
            self.jobs.lock().unwrap().push((delay, job));
            Ok(())
        }
    }
}
