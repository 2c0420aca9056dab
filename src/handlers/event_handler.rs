use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, FullEvent};
use serenity::CreateInteractionResponse;
use tracing::{debug, error, info};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::cache::ChatInfo;
use crate::events::{Attachment, CallbackEvent, ContentEvent, HealthEvent, JoinEvent};

/// Translates gateway events into the internal event shapes and publishes
/// them on the bus. The pipelines in `handlers::router` pick them up from
/// there; nothing moderation-related runs on the gateway task itself.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            info!("Bot ready as {}", data_about_bot.user.name);
            data.bus.publish_health(HealthEvent::Ready {
                bot_name: data_about_bot.user.name.clone(),
            });
        }

        FullEvent::Resume { .. } => {
            data.bus.publish_health(HealthEvent::Resumed);
        }

        FullEvent::Message { new_message } => {
            if let Some(event) = content_event(new_message, false) {
                data.bus.publish_content(event);
            }
        }

        FullEvent::MessageUpdate { new, .. } => {
            // Edits re-enter the same content pipeline as fresh posts
            match new {
                Some(message) => {
                    if let Some(event) = content_event(message, true) {
                        data.bus.publish_content(event);
                    }
                }
                None => debug!("Message edit without cached payload; skipping"),
            }
        }

        FullEvent::GuildMemberAddition { new_member } => {
            data.bus.publish_join(JoinEvent {
                chat_id: new_member.guild_id.get(),
                user_id: new_member.user.id.get(),
                display_name: new_member.display_name().to_string(),
                avatar_url: new_member.user.avatar_url(),
            });
        }

        FullEvent::InteractionCreate { interaction } => {
            if let serenity::Interaction::Component(component) = interaction {
                // Acknowledge immediately; the pipeline does the real work
                if let Err(e) = component
                    .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                    .await
                {
                    error!("Could not acknowledge component interaction: {:?}", e);
                }

                data.bus.publish_callback(CallbackEvent {
                    chat_id: component.guild_id.map(|g| g.get()),
                    channel_id: component.channel_id.get(),
                    message_id: component.message.id.get(),
                    user_id: component.user.id.get(),
                    custom_id: component.data.custom_id.clone(),
                });
            }
        }

        FullEvent::GuildCreate { guild, .. } => {
            data.chat_cache.insert(ChatInfo {
                chat_id: guild.id.get(),
                name: guild.name.clone(),
                member_count: Some(guild.member_count),
            });
        }

        FullEvent::GuildDelete { incomplete, .. } => {
            data.chat_cache.remove(incomplete.id.get());
            data.bus.publish_health(HealthEvent::ChatRemoved {
                chat_id: incomplete.id.get(),
            });
            debug!("Chat {} removed, dropped from cache", incomplete.id);
        }

        _ => {}
    }

    Ok(())
}

fn content_event(message: &serenity::Message, is_edit: bool) -> Option<ContentEvent> {
    // Direct messages and other bots are outside moderation scope
    let chat_id = message.guild_id?.get();
    if message.author.bot {
        return None;
    }

    Some(ContentEvent {
        chat_id,
        channel_id: message.channel_id.get(),
        message_id: message.id.get(),
        user_id: message.author.id.get(),
        user_display_name: message
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| message.author.name.clone()),
        user_avatar_url: message.author.avatar_url(),
        text: message.content.clone(),
        mention_count: message.mentions.len(),
        attachments: message
            .attachments
            .iter()
            .map(|a| Attachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
            })
            .collect(),
        is_edit,
    })
}
