use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use serenity::http::Http;
use tracing::info;

use crate::bot::error::Error;

/// An immutable (token, client) pair. Swapped wholesale so readers never see
/// a client paired with a stale token.
pub struct ClientHandle {
    token_fingerprint: u64,
    pub http: Arc<Http>,
}

/// Single-slot holder for the active platform client.
///
/// Readers clone the current `Arc<ClientHandle>` and keep using it for the
/// duration of their call; in-flight requests against a replaced handle are
/// allowed to complete but are not retried. The lock is held only for the
/// pointer swap, never across an external call.
pub struct ClientSlot {
    inner: RwLock<Option<Arc<ClientHandle>>>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Install a client for the given token. A no-op when the token is
    /// unchanged, so repeated installs keep the same live handle.
    pub fn install(&self, token: &str, http: Arc<Http>) {
        let fingerprint = fingerprint(token);

        {
            let guard = self.inner.read().expect("client slot poisoned");
            if let Some(current) = guard.as_ref() {
                if current.token_fingerprint == fingerprint {
                    return;
                }
            }
        }

        let handle = Arc::new(ClientHandle {
            token_fingerprint: fingerprint,
            http,
        });

        let mut guard = self.inner.write().expect("client slot poisoned");
        let replacing = guard.is_some();
        *guard = Some(handle);
        drop(guard);

        if replacing {
            info!("Platform client replaced after token change");
        }
    }

    pub fn current(&self) -> Option<Arc<ClientHandle>> {
        self.inner.read().expect("client slot poisoned").clone()
    }

    pub fn http(&self) -> Result<Arc<Http>, Error> {
        self.current()
            .map(|handle| handle.http.clone())
            .ok_or_else(|| Error::ConfigNotFound("no active platform client".to_string()))
    }
}

impl Default for ClientSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// The slot never stores the raw token, only a hash for change detection
fn fingerprint(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}
