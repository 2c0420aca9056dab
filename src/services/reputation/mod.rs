pub mod cache;
pub mod client;

pub use cache::ReputationChecker;
pub use client::{HttpReputationClient, ReputationApi};

use std::time::Duration;

use crate::config::Settings;

/// Result of a third-party bad-actor lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationCheckResult {
    pub is_banned: bool,
    pub reason: Option<String>,
}

impl ReputationCheckResult {
    pub fn not_banned() -> Self {
        Self {
            is_banned: false,
            reason: None,
        }
    }
}

/// Caller-supplied configuration; the checker owns no global state beyond
/// its cache
#[derive(Debug, Clone)]
pub struct ReputationConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl ReputationConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.reputation_enabled,
            endpoint: settings.reputation_endpoint.clone(),
            timeout: Duration::from_secs(settings.reputation_timeout_secs),
        }
    }
}
