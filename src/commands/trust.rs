use poise::serenity_prelude::User;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::db::queries::trust;
use crate::utils::{formatting, permissions};

/// Mark a user as trusted; their messages skip spam screening
#[poise::command(slash_command, guild_only)]
pub async fn trust(
    ctx: Context<'_>,
    #[description = "User to trust"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;
    let author_id = ctx.author().id;

    if !permissions::can_moderate(ctx.serenity_context(), guild_id, author_id).await {
        ctx.send(
            poise::CreateReply::default()
                .content("You need moderation permissions to manage trusted users.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    trust::grant(
        &ctx.data().pool,
        guild_id.get() as i64,
        user.id.get() as i64,
        author_id.get() as i64,
    )
    .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "{} is now trusted. Critical content rules still apply to them.",
                formatting::mention(user.id.get())
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Remove a user's trusted status
#[poise::command(slash_command, guild_only)]
pub async fn untrust(
    ctx: Context<'_>,
    #[description = "User to remove trust from"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;
    let author_id = ctx.author().id;

    if !permissions::can_moderate(ctx.serenity_context(), guild_id, author_id).await {
        ctx.send(
            poise::CreateReply::default()
                .content("You need moderation permissions to manage trusted users.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let removed = trust::revoke(
        &ctx.data().pool,
        guild_id.get() as i64,
        user.id.get() as i64,
    )
    .await?;

    let reply = if removed {
        format!(
            "{} is no longer trusted.",
            formatting::mention(user.id.get())
        )
    } else {
        format!("{} was not trusted.", formatting::mention(user.id.get()))
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}

/// List the trusted users of this server
#[poise::command(slash_command, guild_only)]
pub async fn trusted(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;

    let users = trust::list_for_chat(&ctx.data().pool, guild_id.get() as i64).await?;

    let reply = if users.is_empty() {
        "No trusted users in this server.".to_string()
    } else {
        let mut text = format!("{} trusted user(s):\n", users.len());
        for entry in &users {
            text.push_str(&format!(
                "- {} (granted by {})\n",
                formatting::mention(entry.user_id as u64),
                formatting::mention(entry.granted_by as u64)
            ));
        }
        text
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}
