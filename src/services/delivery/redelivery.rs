use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::bot::error::Error;
use crate::constants::moderation::{REDELIVERY_SWEEP_BATCH, REDELIVERY_SWEEP_INTERVAL};
use crate::db::models::QueuedNotification;
use crate::platform::api::{ChatApi, ChatApiError};
use crate::services::delivery::engine::DeliveryStore;

/// Retry every queued notification for one user, oldest first. Called when
/// the user interacts with the bot again, which is the strongest signal that
/// direct delivery might work now. Stops at the first still-blocked send.
pub async fn flush_pending(
    api: &dyn ChatApi,
    store: &dyn DeliveryStore,
    user_id: u64,
) -> Result<usize, Error> {
    let pending = store.pending_for(user_id).await?;
    if pending.is_empty() {
        return Ok(0);
    }

    let mut delivered = 0;
    for entry in pending {
        match send_entry(api, &entry).await {
            Ok(_) => {
                store.mark_delivered(entry.id).await?;
                delivered += 1;
            }
            Err(ChatApiError::Blocked) => {
                debug!("User {} still blocks direct delivery", user_id);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if delivered > 0 {
        store.set_dm_capability(user_id, true).await?;
        info!(
            "Redelivered {} queued notification(s) to user {}",
            delivered, user_id
        );
    }

    Ok(delivered)
}

/// Periodic safety net so queue entries are not stranded until the user
/// happens to interact again
pub fn spawn_redelivery_sweep(api: Arc<dyn ChatApi>, store: Arc<dyn DeliveryStore>) {
    tokio::spawn(async move {
        let mut ticker = interval(REDELIVERY_SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            if let Err(e) = sweep_once(api.as_ref(), store.as_ref()).await {
                error!("Redelivery sweep failed: {:?}", e);
            }
        }
    });
}

async fn sweep_once(api: &dyn ChatApi, store: &dyn DeliveryStore) -> Result<(), Error> {
    let entries = store.list_undelivered(REDELIVERY_SWEEP_BATCH).await?;
    if entries.is_empty() {
        return Ok(());
    }

    let mut still_blocked: HashSet<u64> = HashSet::new();

    for entry in entries {
        let user_id = entry.user_id as u64;
        if still_blocked.contains(&user_id) {
            continue;
        }

        match send_entry(api, &entry).await {
            Ok(_) => store.mark_delivered(entry.id).await?,
            Err(ChatApiError::Blocked) => {
                still_blocked.insert(user_id);
            }
            Err(e) => {
                // Transient platform trouble; the entry stays for next sweep
                warn!("Redelivery of {} failed: {} (will retry)", entry.id, e);
            }
        }
    }

    Ok(())
}

async fn send_entry(api: &dyn ChatApi, entry: &QueuedNotification) -> Result<u64, ChatApiError> {
    let user_id = entry.user_id as u64;

    if let Some(photo) = &entry.photo_path {
        api.send_direct_photo(user_id, Path::new(photo), &entry.body)
            .await
    } else if let Some(video) = &entry.video_path {
        api.send_direct_video(user_id, Path::new(video), &entry.body)
            .await
    } else {
        api.send_direct_message(user_id, &entry.body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delivery::engine::test_support::{MemoryStore, RecordingChatApi};
    use crate::services::delivery::engine::{DeliveryStore, NotificationKind};

    #[tokio::test]
    async fn flush_delivers_pending_entries_in_order() {
        let api = RecordingChatApi::default();
        let store = MemoryStore::default();

        store
            .enqueue(7, NotificationKind::Moderation, "first", None, None)
            .await
            .unwrap();
        store
            .enqueue(7, NotificationKind::System, "second", None, None)
            .await
            .unwrap();

        let delivered = flush_pending(&api, &store, 7).await.unwrap();

        assert_eq!(delivered, 2);
        let sent = api.direct_messages.lock().unwrap();
        assert_eq!(sent[0].1, "first");
        assert_eq!(sent[1].1, "second");
        assert!(store.pending_for(7).await.unwrap().is_empty());
        assert_eq!(store.dm_flags.lock().unwrap().get(&7), Some(&true));
    }

    #[tokio::test]
    async fn flush_stops_while_still_blocked() {
        let api = RecordingChatApi::blocked();
        let store = MemoryStore::default();

        store
            .enqueue(7, NotificationKind::Moderation, "first", None, None)
            .await
            .unwrap();

        let delivered = flush_pending(&api, &store, 7).await.unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(store.pending_for(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flush_with_empty_queue_is_a_noop() {
        let api = RecordingChatApi::default();
        let store = MemoryStore::default();

        assert_eq!(flush_pending(&api, &store, 7).await.unwrap(), 0);
        assert!(api.direct_messages.lock().unwrap().is_empty());
    }
}
