use sqlx::PgPool;

use crate::db::models::ChatConfig;

pub async fn get_or_create(pool: &PgPool, chat_id: i64) -> Result<ChatConfig, sqlx::Error> {
    // Try to get existing config
    let existing =
        sqlx::query_as::<_, ChatConfig>("SELECT * FROM chat_configs WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_optional(pool)
            .await?;

    if let Some(config) = existing {
        return Ok(config);
    }

    // Create new config with defaults
    sqlx::query_as::<_, ChatConfig>(
        r#"
        INSERT INTO chat_configs (chat_id)
        VALUES ($1)
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .fetch_one(pool)
    .await
}

pub async fn set_moderation_enabled(
    pool: &PgPool,
    chat_id: i64,
    enabled: bool,
) -> Result<ChatConfig, sqlx::Error> {
    get_or_create(pool, chat_id).await?;

    sqlx::query_as::<_, ChatConfig>(
        r#"
        UPDATE chat_configs
        SET moderation_enabled = $2, updated_at = NOW()
        WHERE chat_id = $1
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(enabled)
    .fetch_one(pool)
    .await
}

pub async fn set_impersonation_enabled(
    pool: &PgPool,
    chat_id: i64,
    enabled: bool,
) -> Result<ChatConfig, sqlx::Error> {
    get_or_create(pool, chat_id).await?;

    sqlx::query_as::<_, ChatConfig>(
        r#"
        UPDATE chat_configs
        SET impersonation_check_enabled = $2, updated_at = NOW()
        WHERE chat_id = $1
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(enabled)
    .fetch_one(pool)
    .await
}

pub async fn set_alert_channel(
    pool: &PgPool,
    chat_id: i64,
    channel_id: Option<i64>,
) -> Result<ChatConfig, sqlx::Error> {
    get_or_create(pool, chat_id).await?;

    sqlx::query_as::<_, ChatConfig>(
        r#"
        UPDATE chat_configs
        SET alert_channel_id = $2, updated_at = NOW()
        WHERE chat_id = $1
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(channel_id)
    .fetch_one(pool)
    .await
}
