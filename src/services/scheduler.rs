use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::bot::error::Error;
use crate::platform::api::ChatApi;
use crate::services::delivery::engine::DeliveryStore;
use crate::services::delivery::redelivery;

/// One-shot deferred actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledJob {
    /// Remove an in-channel fallback post after its grace period
    DeleteMessage { channel_id: u64, message_id: u64 },
    /// Retry a user's queued notifications
    FlushNotifications { user_id: u64 },
}

#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn schedule(&self, delay: Duration, job: ScheduledJob) -> Result<(), Error>;
}

/// Runs each job on its own task after the delay. Job failures are logged
/// and dropped; a missed auto-delete is cosmetic, not a correctness problem.
pub struct TokioScheduler {
    api: Arc<dyn ChatApi>,
    store: Arc<dyn DeliveryStore>,
}

impl TokioScheduler {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<dyn DeliveryStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl JobScheduler for TokioScheduler {
    async fn schedule(&self, delay: Duration, job: ScheduledJob) -> Result<(), Error> {
        let api = self.api.clone();
        let store = self.store.clone();

        debug!("Scheduling {:?} in {:?}", job, delay);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            match job {
                ScheduledJob::DeleteMessage {
                    channel_id,
                    message_id,
                } => {
                    if let Err(e) = api.delete_message(channel_id, message_id).await {
                        warn!(
                            "Scheduled deletion of message {} in channel {} failed: {}",
                            message_id, channel_id, e
                        );
                    }
                }
                ScheduledJob::FlushNotifications { user_id } => {
                    if let Err(e) =
                        redelivery::flush_pending(api.as_ref(), store.as_ref(), user_id).await
                    {
                        warn!(
                            "Scheduled notification flush for user {} failed: {:?}",
                            user_id, e
                        );
                    }
                }
            }
        });

        Ok(())
    }
}
