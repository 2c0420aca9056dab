use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info};

use crate::bot::error::Error;
use crate::db::queries::audit;
use crate::events::ContentEvent;
use crate::platform::api::ChatApi;
use crate::services::delivery::DeliveryEngine;
use crate::services::moderation::verdict::ModerationVerdict;
use crate::utils::formatting;

/// Turns a verdict into platform effects: audit, delete, notify.
///
/// Actions are driven purely by the verdict. A verdict produced under a
/// dependency outage already fails open, so nothing here can delete or ban
/// on the back of an outage.
pub struct ActionExecutor {
    api: Arc<dyn ChatApi>,
    delivery: Arc<DeliveryEngine>,
    pool: PgPool,
    auto_delete_seconds: u64,
}

impl ActionExecutor {
    pub fn new(
        api: Arc<dyn ChatApi>,
        delivery: Arc<DeliveryEngine>,
        pool: PgPool,
        auto_delete_seconds: u64,
    ) -> Self {
        Self {
            api,
            delivery,
            pool,
            auto_delete_seconds,
        }
    }

    pub async fn apply(
        &self,
        event: &ContentEvent,
        verdict: &ModerationVerdict,
    ) -> Result<(), Error> {
        audit::record(&self.pool, event, verdict).await?;

        if verdict.should_allow() {
            debug!(
                "Message {} from user {} allowed",
                event.message_id, event.user_id
            );
            return Ok(());
        }

        self.api
            .delete_message(event.channel_id, event.message_id)
            .await?;

        info!(
            "Deleted message {} from user {} in chat {}",
            event.message_id, event.user_id, event.chat_id
        );

        let notice = if verdict.has_critical_violations() {
            formatting::critical_notice(&verdict.critical_violations)
        } else {
            formatting::spam_notice()
        };

        // Tell the sender why; if their DMs are closed the notice lands in
        // the channel briefly and cleans itself up
        let result = self
            .delivery
            .send_direct(
                event.user_id,
                &notice,
                Some(event.channel_id),
                Some(self.auto_delete_seconds),
            )
            .await?;

        debug!(
            "Removal notice for user {} delivered as {:?}",
            event.user_id, result
        );

        Ok(())
    }
}
