use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueuedNotification {
    pub id: Uuid,
    pub user_id: i64,
    pub kind: String,
    pub body: String,
    pub photo_path: Option<String>,
    pub video_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}
