use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::bot::error::Error;
use crate::db::queries::trust;
use crate::platform::api::ChatApi;

/// Point-in-time trust and admin lookups. Both are evaluated fresh per
/// event; nothing here is cached, so a revoked grant takes effect on the
/// very next message.
#[async_trait]
pub trait TrustSource: Send + Sync {
    async fn is_trusted(&self, user_id: u64, chat_id: u64) -> Result<bool, Error>;
    async fn is_admin(&self, user_id: u64, chat_id: u64) -> Result<bool, Error>;
}

/// Trust grants live in the database; admin status comes from the platform
pub struct ChatTrustSource {
    pool: PgPool,
    api: Arc<dyn ChatApi>,
}

impl ChatTrustSource {
    pub fn new(pool: PgPool, api: Arc<dyn ChatApi>) -> Self {
        Self { pool, api }
    }
}

#[async_trait]
impl TrustSource for ChatTrustSource {
    async fn is_trusted(&self, user_id: u64, chat_id: u64) -> Result<bool, Error> {
        Ok(trust::is_trusted(&self.pool, chat_id as i64, user_id as i64).await?)
    }

    async fn is_admin(&self, user_id: u64, chat_id: u64) -> Result<bool, Error> {
        Ok(self.api.is_member_admin(chat_id, user_id).await?)
    }
}
