use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerdictAudit {
    pub id: Uuid,
    pub chat_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub allowed: bool,
    pub spam: bool,
    pub critical_count: i32,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
