use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrustedUser {
    pub chat_id: i64,
    pub user_id: i64,
    pub granted_by: i64,
    pub created_at: DateTime<Utc>,
}
