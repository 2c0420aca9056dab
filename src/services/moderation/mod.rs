pub mod action;
pub mod critical;
pub mod decision;
pub mod spam;
pub mod verdict;

pub use decision::DecisionCoordinator;
pub use verdict::{ModerationVerdict, SkipReason, SpamClassification};
