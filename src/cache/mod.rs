pub mod chat_cache;

pub use chat_cache::{ChatCache, ChatInfo};
