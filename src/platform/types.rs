//! Platform identifier newtypes and message/guild snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// A community space containing channels, members and roles.
    GuildId
);
id_type!(
    /// A text channel within a guild.
    ChannelId
);
id_type!(
    /// A platform user.
    UserId
);
id_type!(
    /// A single chat message.
    MessageId
);

/// An inbound chat message as delivered by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub guild: GuildId,
    pub channel: ChannelId,
    pub author: UserId,
    /// Raw message text.
    pub content: String,
    /// Direct + role mentions combined.
    pub mention_count: u32,
    /// Whether the author is a bot account (bot traffic is never moderated).
    pub author_is_bot: bool,
    pub sent_at: DateTime<Utc>,
}

/// Guild snapshot from a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
    pub member_count: usize,
}

/// Channel snapshot from a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild: GuildId,
    pub name: String,
}
