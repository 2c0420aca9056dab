use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::interval;
use tracing::{error, info};

use crate::constants::moderation::CHAT_CACHE_SWEEP_INTERVAL;
use crate::platform::api::ChatApi;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatInfo {
    pub chat_id: u64,
    pub name: String,
    pub member_count: Option<u64>,
}

/// In-memory chat metadata, one entry per chat the bot serves. Unbounded on
/// purpose at this scale. Removal events prune entries, and a periodic
/// reconciliation sweep catches any removal path that never produced an
/// event.
pub struct ChatCache {
    inner: DashMap<u64, ChatInfo>,
}

impl ChatCache {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn insert(&self, info: ChatInfo) {
        self.inner.insert(info.chat_id, info);
    }

    pub fn get(&self, chat_id: u64) -> Option<ChatInfo> {
        self.inner.get(&chat_id).map(|entry| entry.clone())
    }

    pub fn remove(&self, chat_id: u64) {
        self.inner.remove(&chat_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every entry whose chat is no longer served; returns how many
    /// entries were removed
    pub fn reconcile(&self, live_chats: &HashSet<u64>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|chat_id, _| live_chats.contains(chat_id));
        before - self.inner.len()
    }
}

impl Default for ChatCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically reconcile the cache against the platform's own list of
/// joined chats
pub fn spawn_reconciliation_sweep(api: Arc<dyn ChatApi>, cache: Arc<ChatCache>) {
    tokio::spawn(async move {
        let mut ticker = interval(CHAT_CACHE_SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            match api.list_joined_chats().await {
                Ok(chats) => {
                    let live: HashSet<u64> = chats.into_iter().collect();
                    let removed = cache.reconcile(&live);
                    if removed > 0 {
                        info!("Chat cache sweep removed {} stale entries", removed);
                    }
                }
                Err(e) => {
                    error!("Chat cache sweep could not list joined chats: {}", e);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(chat_id: u64) -> ChatInfo {
        ChatInfo {
            chat_id,
            name: format!("chat-{}", chat_id),
            member_count: None,
        }
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let cache = ChatCache::new();
        cache.insert(info(1));

        assert_eq!(cache.get(1).unwrap().name, "chat-1");
        cache.remove(1);
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn reconcile_drops_entries_for_departed_chats() {
        let cache = ChatCache::new();
        cache.insert(info(1));
        cache.insert(info(2));
        cache.insert(info(3));

        let live: HashSet<u64> = [1, 3].into_iter().collect();
        let removed = cache.reconcile(&live);

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(2).is_none());
        assert!(cache.get(1).is_some());
    }
}
