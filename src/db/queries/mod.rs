pub mod audit;
pub mod chat_config;
pub mod member_stats;
pub mod notification;
pub mod trust;
