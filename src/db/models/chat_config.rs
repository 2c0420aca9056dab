use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatConfig {
    pub chat_id: i64,
    pub moderation_enabled: bool,
    pub impersonation_check_enabled: bool,
    pub alert_channel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatConfig {
    /// Channel where admin alerts land, if one is configured
    pub fn alert_channel(&self) -> Option<u64> {
        self.alert_channel_id.map(|id| id as u64)
    }
}
