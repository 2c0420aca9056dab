use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::db::queries::chat_config;
use crate::utils::permissions;

/// Route impersonation alerts to the channel this command is used in
#[poise::command(slash_command, guild_only)]
pub async fn alerts(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;
    let author_id = ctx.author().id;

    if !permissions::is_admin(ctx.serenity_context(), guild_id, author_id).await {
        ctx.send(
            poise::CreateReply::default()
                .content("Only administrators can change the alert channel.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    chat_config::set_alert_channel(
        &ctx.data().pool,
        guild_id.get() as i64,
        Some(ctx.channel_id().get() as i64),
    )
    .await?;

    ctx.send(
        poise::CreateReply::default()
            .content("Impersonation alerts will be posted in this channel.")
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Switch moderation on or off for this server
#[poise::command(slash_command, guild_only)]
pub async fn moderation(
    ctx: Context<'_>,
    #[description = "Enable or disable moderation"] enabled: bool,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;
    let author_id = ctx.author().id;

    if !permissions::is_admin(ctx.serenity_context(), guild_id, author_id).await {
        ctx.send(
            poise::CreateReply::default()
                .content("Only administrators can switch moderation on or off.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    chat_config::set_moderation_enabled(&ctx.data().pool, guild_id.get() as i64, enabled).await?;

    let reply = if enabled {
        "Moderation is now enabled for this server."
    } else {
        "Moderation is now disabled for this server."
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}
