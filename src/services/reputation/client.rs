use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::bot::error::Error;
use crate::services::reputation::ReputationCheckResult;

/// The external reputation lookup, timeout-bounded per call
#[async_trait]
pub trait ReputationApi: Send + Sync {
    async fn lookup(
        &self,
        user_id: u64,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<ReputationCheckResult, Error>;
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    banned: bool,
    #[serde(default)]
    reason: Option<String>,
}

pub struct HttpReputationClient {
    client: reqwest::Client,
}

impl HttpReputationClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpReputationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReputationApi for HttpReputationClient {
    async fn lookup(
        &self,
        user_id: u64,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<ReputationCheckResult, Error> {
        let url = format!("{}/check/{}", endpoint.trim_end_matches('/'), user_id);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let body: WireResponse = response.json().await?;

        Ok(ReputationCheckResult {
            is_banned: body.banned,
            reason: body.reason,
        })
    }
}
