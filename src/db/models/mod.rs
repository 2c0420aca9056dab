mod chat_config;
mod member_stats;
mod notification;
mod trusted_user;
mod verdict_audit;

pub use chat_config::ChatConfig;
pub use member_stats::MemberStats;
pub use notification::QueuedNotification;
pub use trusted_user::TrustedUser;
pub use verdict_audit::VerdictAudit;
