pub mod engine;
pub mod redelivery;

pub use engine::{DeliveryEngine, DeliveryResult, DeliveryStore, NotificationKind};
