//! Volatile per-guild rule cache.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::info;

use crate::platform::GuildId;
use crate::rules::model::{GuildRules, RulesPatch};

/// In-memory rule cache with lazy default materialization.
///
/// The two operations here (`get`, `apply`) are the whole contract — an
/// external store can be substituted behind them without touching callers.
pub struct RuleStore {
    guilds: RwLock<HashMap<GuildId, GuildRules>>,
    defaults: GuildRules,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::with_defaults(GuildRules::default())
    }

    /// Use a non-standard baseline for newly-seen guilds.
    pub fn with_defaults(defaults: GuildRules) -> Self {
        Self {
            guilds: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    /// Effective rules for a guild; never fails.
    ///
    /// An unseen guild gets a full default set materialized on first
    /// reference.
    pub async fn get(&self, guild: GuildId) -> GuildRules {
        if let Some(rules) = self.guilds.read().await.get(&guild) {
            return rules.clone();
        }
        let mut guilds = self.guilds.write().await;
        guilds
            .entry(guild)
            .or_insert_with(|| self.defaults.clone())
            .clone()
    }

    /// Merge a partial patch and return the new effective set.
    pub async fn apply(&self, guild: GuildId, patch: RulesPatch) -> GuildRules {
        let mut guilds = self.guilds.write().await;
        let rules = guilds
            .entry(guild)
            .or_insert_with(|| self.defaults.clone());
        rules.merge(patch);
        info!(guild = %guild, "Updated moderation rules");
        rules.clone()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}
