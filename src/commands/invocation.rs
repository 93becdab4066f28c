//! The shared invocation context.
//!
//! Carries who/where/what triggered a command. Chat messages and remote
//! dashboard requests each build one; everything downstream depends only on
//! this type.

use crate::platform::{ChannelId, ChatMessage, GuildId, MessageId, UserId};

/// Where an invocation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// An organic chat message.
    Chat { message: MessageId },
    /// A remote request relayed over the dashboard bridge.
    Remote,
}

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild: GuildId,
    pub channel: ChannelId,
    /// The invoking user; remote invocations are authored as the bot.
    pub author: UserId,
    pub origin: Origin,
    /// Reconstructed full text, prefix included.
    pub text: String,
    /// Lowercased command name.
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Parse a chat message with the guild's prefix.
    ///
    /// Returns `None` when the message is not a command (no prefix, or
    /// nothing after it).
    pub fn from_message(msg: &ChatMessage, prefix: &str) -> Option<Self> {
        let rest = msg.content.strip_prefix(prefix)?;
        let mut parts = rest.split_whitespace();
        let command = parts.next()?.to_lowercase();
        let args: Vec<String> = parts.map(str::to_string).collect();
        Some(Self {
            guild: msg.guild,
            channel: msg.channel,
            author: msg.author,
            origin: Origin::Chat { message: msg.id },
            text: msg.content.clone(),
            command,
            args,
        })
    }

    /// Build a remote invocation authored as the bot.
    pub fn remote(
        bot: UserId,
        guild: GuildId,
        channel: ChannelId,
        prefix: &str,
        command: &str,
        args: Vec<String>,
    ) -> Self {
        let command = command.to_lowercase();
        let text = if args.is_empty() {
            format!("{prefix}{command}")
        } else {
            format!("{prefix}{command} {}", args.join(" "))
        };
        Self {
            guild,
            channel,
            author: bot,
            origin: Origin::Remote,
            text,
            command,
            args,
        }
    }
}
