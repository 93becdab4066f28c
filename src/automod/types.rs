//! Shared moderation types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::platform::{ChannelId, GuildId, MessageId, UserId};
use crate::rules::RuleCategory;

/// A single triggered moderation decision.
///
/// Ephemeral by design: produced by the monitor, consumed synchronously by
/// the executor, never persisted.
#[derive(Debug, Clone)]
pub struct ModerationEvent {
    pub id: Uuid,
    pub category: RuleCategory,
    pub guild: GuildId,
    pub channel: ChannelId,
    pub user: UserId,
    pub message: MessageId,
    /// What triggered the decision — offending content or a counter summary.
    pub evidence: String,
    pub at: DateTime<Utc>,
}

impl ModerationEvent {
    pub fn new(
        category: RuleCategory,
        guild: GuildId,
        channel: ChannelId,
        user: UserId,
        message: MessageId,
        evidence: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            guild,
            channel,
            user,
            message,
            evidence: evidence.into(),
            at,
        }
    }
}
