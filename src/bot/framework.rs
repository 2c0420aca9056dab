use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, GatewayIntents, GuildId};
use sqlx::PgPool;
use tracing::{error, info};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::cache::chat_cache;
use crate::commands;
use crate::config::Settings;
use crate::handlers::event_handler::event_handler;
use crate::handlers::router;
use crate::services::delivery::redelivery;

pub async fn run(settings: Settings, pool: PgPool) -> Result<(), Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::trust::trust(),
                commands::trust::untrust(),
                commands::trust::trusted(),
                commands::config::alerts(),
                commands::config::moderation(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: None, // Slash commands only
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say(format!("Error: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
                            let _ = ctx.say(format!("Invalid argument: {}", error)).await;
                        }
                        poise::FrameworkError::UnknownCommand { .. } => {
                            // Bot only uses slash commands; ignore pings
                        }
                        err => {
                            error!("Framework error: {:?}", err);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup({
            let settings = settings.clone();
            let pool = pool.clone();
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Bot connected as {}", ready.user.name);

                    let data = Data::new(pool, settings, ctx.http.clone());

                    // Pipelines and background sweeps live for the whole run
                    router::spawn_pipelines(data.clone());
                    redelivery::spawn_redelivery_sweep(
                        data.engines.api.clone(),
                        data.engines.store.clone(),
                    );
                    chat_cache::spawn_reconciliation_sweep(
                        data.engines.api.clone(),
                        data.chat_cache.clone(),
                    );
                    info!("Moderation pipelines started");

                    // Register commands per-guild when pinned, globally otherwise
                    match data.settings.guild_id {
                        Some(guild_id) => {
                            let guild_id = GuildId::new(guild_id);
                            poise::builtins::register_in_guild(
                                ctx,
                                &framework.options().commands,
                                guild_id,
                            )
                            .await
                            .map_err(Error::Serenity)?;
                            info!(
                                "Registered {} commands in guild {}",
                                framework.options().commands.len(),
                                guild_id
                            );
                        }
                        None => {
                            poise::builtins::register_globally(ctx, &framework.options().commands)
                                .await
                                .map_err(Error::Serenity)?;
                            info!(
                                "Registered {} commands globally (may take up to an hour to appear)",
                                framework.options().commands.len()
                            );
                        }
                    }

                    Ok(data)
                })
            }
        })
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(Error::Serenity)?;

    info!("Starting Discord client...");
    client.start().await.map_err(Error::Serenity)
}
