use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::events::CallbackEvent;
use crate::services::delivery::redelivery;
use crate::utils::formatting;

/// Callback pipeline: impersonation-alert buttons plus queued-notification
/// flush for whoever pressed the button.
pub async fn handle_callback(data: &Arc<Data>, event: &CallbackEvent) -> Result<(), Error> {
    // Any interaction proves the user is reachable again; retry what we owe
    // them before anything else
    match redelivery::flush_pending(
        data.engines.api.as_ref(),
        data.engines.store.as_ref(),
        event.user_id,
    )
    .await
    {
        Ok(0) => {}
        Ok(count) => debug!(
            "Flushed {} queued notification(s) for user {}",
            count, event.user_id
        ),
        Err(e) => warn!(
            "Queued-notification flush for user {} failed: {:?}",
            event.user_id, e
        ),
    }

    let custom_id = &event.custom_id;

    if custom_id.starts_with("imp_ban_") || custom_id.starts_with("imp_dismiss_") {
        handle_impersonation_response(data, event).await?;
    } else {
        debug!("Unknown callback: {}", custom_id);
    }

    Ok(())
}

/// Responses to the impersonation alert buttons. Only chat admins may
/// resolve an alert.
async fn handle_impersonation_response(
    data: &Arc<Data>,
    event: &CallbackEvent,
) -> Result<(), Error> {
    // Parse custom_id: imp_{action}_{chat_id}_{user_id}
    let parts: Vec<&str> = event.custom_id.split('_').collect();
    if parts.len() < 4 {
        warn!("Malformed impersonation callback: {}", event.custom_id);
        return Ok(());
    }

    let action = parts[1];
    let chat_id: u64 = match parts[2].parse() {
        Ok(id) => id,
        Err(_) => {
            warn!("Invalid chat id in callback: {}", event.custom_id);
            return Ok(());
        }
    };
    let suspect_id: u64 = match parts[3].parse() {
        Ok(id) => id,
        Err(_) => {
            warn!("Invalid user id in callback: {}", event.custom_id);
            return Ok(());
        }
    };

    // The alert lives in an admin channel, but verify the presser anyway
    if !data
        .engines
        .api
        .is_member_admin(chat_id, event.user_id)
        .await?
    {
        debug!(
            "Non-admin {} pressed an impersonation button; ignoring",
            event.user_id
        );
        return Ok(());
    }

    match action {
        "ban" => {
            data.engines
                .api
                .ban_member(chat_id, suspect_id, "Impersonation confirmed by an administrator")
                .await?;
            info!(
                "Admin {} confirmed impersonation ban of user {} in chat {}",
                event.user_id, suspect_id, chat_id
            );

            // Replace the alert with a resolution note
            data.engines
                .api
                .delete_message(event.channel_id, event.message_id)
                .await?;
            data.engines
                .api
                .send_channel_message(
                    event.channel_id,
                    &format!(
                        "{} was banned by {}.",
                        formatting::mention(suspect_id),
                        formatting::mention(event.user_id)
                    ),
                )
                .await?;
        }
        "dismiss" => {
            info!(
                "Admin {} dismissed impersonation alert for user {} in chat {}",
                event.user_id, suspect_id, chat_id
            );
            data.engines
                .api
                .delete_message(event.channel_id, event.message_id)
                .await?;
        }
        other => {
            debug!("Unknown impersonation action '{}'", other);
        }
    }

    Ok(())
}
