use std::time::Duration;

/// Impersonation score at which an alert is raised for admin review.
/// Downstream severity handling is written against this band; it is part of
/// the detector contract and deliberately not configurable.
pub const IMPERSONATION_REVIEW_SCORE: u32 = 50;

/// Impersonation score at which the suspect is banned without review.
pub const IMPERSONATION_AUTO_BAN_SCORE: u32 = 100;

/// Reputation lookups are cached per user for this long, absolute from the
/// first insert. Entries are refreshed opportunistically on the next lookup
/// after expiry, never proactively.
pub const REPUTATION_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Impersonation scoring defaults (overridable via env vars)
pub const DEFAULT_NEW_USER_MESSAGE_THRESHOLD: u32 = 5;
pub const DEFAULT_NAME_MATCH_WEIGHT: u32 = 50;
pub const DEFAULT_PHOTO_MATCH_WEIGHT: u32 = 50;
pub const DEFAULT_PHOTO_MATCH_THRESHOLD: f32 = 0.8;

/// Photo similarity below this contributes nothing to the score
pub const PHOTO_SIMILARITY_FLOOR: f32 = 0.5;

/// Reputation API default timeout
pub const DEFAULT_REPUTATION_TIMEOUT_SECONDS: u64 = 5;

/// How long in-channel fallback notices live before auto-deletion (default)
pub const DEFAULT_FALLBACK_AUTO_DELETE_SECONDS: u64 = 30;

/// Spam heuristic defaults
pub const DEFAULT_SPAM_SCORE_THRESHOLD: u32 = 60;
pub const SPAM_MENTION_FLOOD_COUNT: usize = 5;
pub const SPAM_LINK_FLOOD_COUNT: usize = 3;

/// Per-kind broadcast channel capacity for the event bus
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Interval between queued-notification redelivery sweeps
pub const REDELIVERY_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Batch size for one redelivery sweep
pub const REDELIVERY_SWEEP_BATCH: i64 = 50;

/// Interval between chat-cache reconciliation sweeps
pub const CHAT_CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);
