use std::env;
use std::path::PathBuf;

use crate::constants::moderation::{
    DEFAULT_FALLBACK_AUTO_DELETE_SECONDS, DEFAULT_NAME_MATCH_WEIGHT,
    DEFAULT_NEW_USER_MESSAGE_THRESHOLD, DEFAULT_PHOTO_MATCH_THRESHOLD,
    DEFAULT_PHOTO_MATCH_WEIGHT, DEFAULT_REPUTATION_TIMEOUT_SECONDS, DEFAULT_SPAM_SCORE_THRESHOLD,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: Option<u64>,

    /// Reputation API: when enabled, an endpoint is required
    pub reputation_enabled: bool,
    pub reputation_endpoint: Option<String>,
    pub reputation_timeout_secs: u64,

    /// Impersonation: users with fewer messages than this are scored on join
    pub new_user_message_threshold: u32,
    pub name_match_weight: u32,
    pub photo_match_weight: u32,
    pub photo_match_threshold: f32,
    /// Where admin/candidate avatars are cached for photo comparison
    pub avatar_cache_dir: PathBuf,

    /// Critical content screening
    pub blocked_domains: Vec<String>,
    pub blocked_file_extensions: Vec<String>,

    /// Delivery: seconds before in-channel fallback notices are deleted
    pub fallback_auto_delete_seconds: u64,

    /// Built-in spam heuristic score threshold (0-100)
    pub spam_score_threshold: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        let discord_token =
            env::var("DISCORD_TOKEN").map_err(|_| "DISCORD_TOKEN environment variable not set")?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable not set")?;

        let guild_id = env::var("GUILD_ID").ok().and_then(|s| s.parse::<u64>().ok());

        let reputation_enabled = env::var("REPUTATION_ENABLED")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let reputation_endpoint = env::var("REPUTATION_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());

        // A reputation feature that is switched on without an endpoint must
        // fail at startup, not silently disable itself
        if reputation_enabled && reputation_endpoint.is_none() {
            return Err(
                "REPUTATION_ENABLED is set but REPUTATION_ENDPOINT is missing".to_string(),
            );
        }

        let reputation_timeout_secs = env::var("REPUTATION_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REPUTATION_TIMEOUT_SECONDS);

        let new_user_message_threshold = env::var("NEW_USER_MESSAGE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NEW_USER_MESSAGE_THRESHOLD);

        let name_match_weight = env::var("IMPERSONATION_NAME_WEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NAME_MATCH_WEIGHT);

        let photo_match_weight = env::var("IMPERSONATION_PHOTO_WEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PHOTO_MATCH_WEIGHT);

        let photo_match_threshold = env::var("IMPERSONATION_PHOTO_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PHOTO_MATCH_THRESHOLD);

        let avatar_cache_dir = env::var("AVATAR_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("warden-avatars"));

        let blocked_domains = csv_list(env::var("BLOCKED_DOMAINS").ok());
        let blocked_file_extensions = csv_list(env::var("BLOCKED_FILE_EXTENSIONS").ok());

        let fallback_auto_delete_seconds = env::var("FALLBACK_AUTO_DELETE_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FALLBACK_AUTO_DELETE_SECONDS);

        let spam_score_threshold = env::var("SPAM_SCORE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SPAM_SCORE_THRESHOLD);

        Ok(Self {
            discord_token,
            database_url,
            guild_id,
            reputation_enabled,
            reputation_endpoint,
            reputation_timeout_secs,
            new_user_message_threshold,
            name_match_weight,
            photo_match_weight,
            photo_match_threshold,
            avatar_cache_dir,
            blocked_domains,
            blocked_file_extensions,
            fallback_auto_delete_seconds,
            spam_score_threshold,
        })
    }
}

fn csv_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
