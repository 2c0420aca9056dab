use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberStats {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_count: i64,
    /// None until a direct send has been attempted at least once
    pub can_receive_dms: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
