use sqlx::PgPool;

use crate::db::models::MemberStats;

/// Bump the message counter for a member, creating the row on first sight
pub async fn increment_message_count(
    pool: &PgPool,
    chat_id: i64,
    user_id: i64,
) -> Result<MemberStats, sqlx::Error> {
    sqlx::query_as::<_, MemberStats>(
        r#"
        INSERT INTO member_stats (chat_id, user_id, message_count)
        VALUES ($1, $2, 1)
        ON CONFLICT (chat_id, user_id)
        DO UPDATE SET
            message_count = member_stats.message_count + 1,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn message_count(pool: &PgPool, chat_id: i64, user_id: i64) -> Result<i64, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT message_count FROM member_stats WHERE chat_id = $1 AND user_id = $2",
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0).unwrap_or(0))
}

/// Record whether the last direct send reached the user. The flag is global
/// per user, not per chat, so it is written for chat_id 0.
pub async fn set_dm_capability(
    pool: &PgPool,
    user_id: i64,
    can_receive: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO member_stats (chat_id, user_id, message_count, can_receive_dms)
        VALUES (0, $1, 0, $2)
        ON CONFLICT (chat_id, user_id)
        DO UPDATE SET can_receive_dms = $2, updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(can_receive)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn can_receive_dms(pool: &PgPool, user_id: i64) -> Result<Option<bool>, sqlx::Error> {
    let row: Option<(Option<bool>,)> = sqlx::query_as(
        "SELECT can_receive_dms FROM member_stats WHERE chat_id = 0 AND user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| r.0))
}
