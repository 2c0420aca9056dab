use sqlx::PgPool;

use crate::db::models::TrustedUser;

pub async fn is_trusted(pool: &PgPool, chat_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1::BIGINT FROM trusted_users WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn grant(
    pool: &PgPool,
    chat_id: i64,
    user_id: i64,
    granted_by: i64,
) -> Result<TrustedUser, sqlx::Error> {
    sqlx::query_as::<_, TrustedUser>(
        r#"
        INSERT INTO trusted_users (chat_id, user_id, granted_by)
        VALUES ($1, $2, $3)
        ON CONFLICT (chat_id, user_id)
        DO UPDATE SET granted_by = $3
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(granted_by)
    .fetch_one(pool)
    .await
}

/// Returns true if a grant was actually removed
pub async fn revoke(pool: &PgPool, chat_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM trusted_users WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_for_chat(pool: &PgPool, chat_id: i64) -> Result<Vec<TrustedUser>, sqlx::Error> {
    sqlx::query_as::<_, TrustedUser>(
        "SELECT * FROM trusted_users WHERE chat_id = $1 ORDER BY created_at",
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await
}
