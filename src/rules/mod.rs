//! Per-guild moderation rule sets.

pub mod model;
pub mod store;

pub use model::{GuildRules, RuleCategory, RulesPatch};
pub use store::RuleStore;
