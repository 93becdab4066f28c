//! Per-guild command prefix cache.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::platform::GuildId;

/// Guild → prefix map with a process-wide default.
///
/// Updated by dashboard `update_settings` frames; volatile like the rule
/// cache.
pub struct PrefixStore {
    default: String,
    overrides: RwLock<HashMap<GuildId, String>>,
}

impl PrefixStore {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Effective prefix for a guild.
    pub async fn get(&self, guild: GuildId) -> String {
        self.overrides
            .read()
            .await
            .get(&guild)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    pub async fn set(&self, guild: GuildId, prefix: &str) {
        self.overrides
            .write()
            .await
            .insert(guild, prefix.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_default() {
        let store = PrefixStore::new(">");
        assert_eq!(store.get(GuildId(1)).await, ">");
        store.set(GuildId(1), "!").await;
        assert_eq!(store.get(GuildId(1)).await, "!");
        assert_eq!(store.get(GuildId(2)).await, ">");
    }
}
