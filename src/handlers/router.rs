use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::db::queries::{chat_config, member_stats};
use crate::events::{ContentEvent, JoinEvent};
use crate::handlers::callback;

/// Start one worker per event kind. Each received event is handled on its
/// own task, so a slow or failing event never delays the ones behind it, and
/// nothing mutable is shared between event scopes.
pub fn spawn_pipelines(data: Arc<Data>) {
    spawn_content_worker(data.clone());
    spawn_join_worker(data.clone());
    spawn_callback_worker(data.clone());
    spawn_health_worker(data);
}

fn spawn_content_worker(data: Arc<Data>) {
    let mut rx = data.bus.subscribe_content();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = data.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_content_event(&data, event).await {
                            error!("Content pipeline error: {:?}", e);
                        }
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Content worker lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_join_worker(data: Arc<Data>) {
    let mut rx = data.bus.subscribe_joins();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = data.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_join_event(&data, event).await {
                            error!("Join pipeline error: {:?}", e);
                        }
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Join worker lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_callback_worker(data: Arc<Data>) {
    let mut rx = data.bus.subscribe_callbacks();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = data.clone();
                    tokio::spawn(async move {
                        if let Err(e) = callback::handle_callback(&data, &event).await {
                            error!("Callback pipeline error: {:?}", e);
                        }
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Callback worker lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_health_worker(data: Arc<Data>) {
    let mut rx = data.bus.subscribe_health();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => info!("Health: {:?}", event),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Content path: decision coordinator, action executor, then impersonation
/// scoring for senders still inside the new-user window
async fn handle_content_event(data: &Arc<Data>, event: ContentEvent) -> Result<(), Error> {
    let config = chat_config::get_or_create(&data.pool, event.chat_id as i64).await?;
    if !config.moderation_enabled {
        return Ok(());
    }

    // Edits re-run moderation but do not count as new messages
    if !event.is_edit {
        member_stats::increment_message_count(
            &data.pool,
            event.chat_id as i64,
            event.user_id as i64,
        )
        .await?;
    }

    let verdict = data.engines.decision.evaluate(&event).await?;
    data.engines.actions.apply(&event, &verdict).await?;

    if config.impersonation_check_enabled
        && data
            .engines
            .impersonation
            .should_check(event.user_id, event.chat_id)
            .await?
    {
        let profile = data
            .engines
            .discord
            .member_profile(
                event.user_id,
                &event.user_display_name,
                event.user_avatar_url.as_deref(),
            )
            .await;

        if let Some(verdict) = data.engines.impersonation.check(&profile, event.chat_id).await? {
            info!(
                "Impersonation score {} for user {} in chat {}",
                verdict.total_score, event.user_id, event.chat_id
            );
            data.engines.impersonation.execute_action(&verdict).await?;
        }
    }

    Ok(())
}

/// Join path: reputation gate first, then impersonation scoring
async fn handle_join_event(data: &Arc<Data>, event: JoinEvent) -> Result<(), Error> {
    let config = chat_config::get_or_create(&data.pool, event.chat_id as i64).await?;
    if !config.moderation_enabled {
        return Ok(());
    }

    let reputation = data
        .engines
        .reputation
        .check_user(event.user_id, &data.engines.reputation_config)
        .await?;

    if reputation.is_banned {
        info!(
            "Banning user {} on join to chat {}: flagged by reputation service ({:?})",
            event.user_id, event.chat_id, reputation.reason
        );
        data.engines
            .api
            .ban_member(
                event.chat_id,
                event.user_id,
                reputation
                    .reason
                    .as_deref()
                    .unwrap_or("Flagged by reputation service"),
            )
            .await?;
        return Ok(());
    }

    if !config.impersonation_check_enabled {
        return Ok(());
    }

    if !data
        .engines
        .impersonation
        .should_check(event.user_id, event.chat_id)
        .await?
    {
        debug!(
            "Skipping impersonation scoring for user {} in chat {}",
            event.user_id, event.chat_id
        );
        return Ok(());
    }

    let profile = data
        .engines
        .discord
        .member_profile(event.user_id, &event.display_name, event.avatar_url.as_deref())
        .await;

    if let Some(verdict) = data.engines.impersonation.check(&profile, event.chat_id).await? {
        info!(
            "Impersonation score {} for joining user {} in chat {}",
            verdict.total_score, event.user_id, event.chat_id
        );
        data.engines.impersonation.execute_action(&verdict).await?;
    }

    Ok(())
}
