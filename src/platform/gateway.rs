//! The consumed capability surface of the chat platform.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::platform::types::{
    ChannelId, ChannelInfo, ChatMessage, GuildId, GuildInfo, MessageId, UserId,
};

/// Capability trait for the chat platform — pure I/O, no business logic.
///
/// Every operation the moderation engine, commands and bridge need from the
/// platform lives here, so the whole engine runs against any adapter.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The bot's own user id (remote invocations are authored as this user).
    fn bot_user(&self) -> UserId;

    /// Look up a guild by id.
    async fn guild(&self, id: GuildId) -> Result<GuildInfo, PlatformError>;

    /// Look up a channel by id within a guild.
    async fn channel(&self, guild: GuildId, id: ChannelId)
    -> Result<ChannelInfo, PlatformError>;

    /// Whether a member holds the message-management capability.
    async fn member_can_manage_messages(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<bool, PlatformError>;

    /// Delete a single message.
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError>;

    /// Send a plain message, returning its id.
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError>;

    /// Send a self-deleting notice (warnings, ephemeral feedback).
    async fn send_notice(
        &self,
        channel: ChannelId,
        content: &str,
        delete_after: Duration,
    ) -> Result<(), PlatformError>;

    /// Time a member out for `duration`.
    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        duration: Duration,
        reason: &str,
    ) -> Result<(), PlatformError>;

    /// Most recent messages in a channel, newest first, bounded by `limit`.
    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError>;

    /// Number of guilds the bot is a member of.
    async fn guild_count(&self) -> usize;

    /// Total member count across all guilds.
    async fn member_count(&self) -> usize;
}
