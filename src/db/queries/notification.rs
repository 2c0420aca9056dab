use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::QueuedNotification;

pub async fn enqueue(
    pool: &PgPool,
    user_id: i64,
    kind: &str,
    body: &str,
    photo_path: Option<&str>,
    video_path: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO notification_queue (id, user_id, kind, body, photo_path, video_path)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(kind)
    .bind(body)
    .bind(photo_path)
    .bind(video_path)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn pending_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<QueuedNotification>, sqlx::Error> {
    sqlx::query_as::<_, QueuedNotification>(
        r#"
        SELECT * FROM notification_queue
        WHERE user_id = $1 AND delivered_at IS NULL
        ORDER BY created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Oldest undelivered entries across all users, for the periodic sweep
pub async fn list_undelivered(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<QueuedNotification>, sqlx::Error> {
    sqlx::query_as::<_, QueuedNotification>(
        r#"
        SELECT * FROM notification_queue
        WHERE delivered_at IS NULL
        ORDER BY created_at
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn mark_delivered(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notification_queue SET delivered_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
