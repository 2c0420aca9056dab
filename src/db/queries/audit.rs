use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::VerdictAudit;
use crate::events::ContentEvent;
use crate::services::moderation::verdict::ModerationVerdict;

/// Persist one audit row per evaluated content event. The verdict itself is
/// never stored anywhere else.
pub async fn record(
    pool: &PgPool,
    event: &ContentEvent,
    verdict: &ModerationVerdict,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let detail = serde_json::to_value(verdict).unwrap_or(serde_json::Value::Null);

    sqlx::query(
        r#"
        INSERT INTO verdict_audits
            (id, chat_id, channel_id, message_id, user_id, allowed, spam, critical_count, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(event.chat_id as i64)
    .bind(event.channel_id as i64)
    .bind(event.message_id as i64)
    .bind(event.user_id as i64)
    .bind(verdict.should_allow())
    .bind(verdict.is_spam())
    .bind(verdict.critical_violations.len() as i32)
    .bind(detail)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Latest audit rows for a chat, newest first
pub async fn recent_for_chat(
    pool: &PgPool,
    chat_id: i64,
    limit: i64,
) -> Result<Vec<VerdictAudit>, sqlx::Error> {
    sqlx::query_as::<_, VerdictAudit>(
        r#"
        SELECT * FROM verdict_audits
        WHERE chat_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(chat_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
