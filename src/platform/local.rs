//! In-memory platform adapter.
//!
//! Backs the CLI driver and the test suite: guilds, channels and message
//! history live in a mutex-guarded map, and every side effect the bot
//! performs is recorded so tests can assert on it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::PlatformError;
use crate::platform::gateway::ChatGateway;
use crate::platform::types::{
    ChannelId, ChannelInfo, ChatMessage, GuildId, GuildInfo, MessageId, UserId,
};

/// Cap on retained per-channel history.
const HISTORY_KEEP: usize = 200;

/// A side effect performed through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Deleted {
        channel: ChannelId,
        message: MessageId,
    },
    Sent {
        channel: ChannelId,
        content: String,
    },
    Notice {
        channel: ChannelId,
        content: String,
        delete_after: Duration,
    },
    Timeout {
        guild: GuildId,
        user: UserId,
        duration: Duration,
        reason: String,
    },
}

#[derive(Debug, Default)]
struct LocalGuild {
    name: String,
    member_count: usize,
    channels: HashMap<ChannelId, String>,
    moderators: HashSet<UserId>,
}

#[derive(Debug, Default)]
struct State {
    guilds: HashMap<GuildId, LocalGuild>,
    history: HashMap<ChannelId, VecDeque<ChatMessage>>,
    effects: Vec<Effect>,
    next_message_id: u64,
    deny_deletes: bool,
    deny_timeouts: bool,
    deny_sends: bool,
}

/// In-memory [`ChatGateway`] implementation.
pub struct LocalGateway {
    bot: UserId,
    state: RwLock<State>,
}

impl LocalGateway {
    pub fn new(bot: UserId) -> Self {
        Self {
            bot,
            state: RwLock::new(State {
                next_message_id: 1_000,
                ..State::default()
            }),
        }
    }

    pub async fn add_guild(&self, id: GuildId, name: &str, member_count: usize) {
        let mut state = self.state.write().await;
        state.guilds.insert(
            id,
            LocalGuild {
                name: name.to_string(),
                member_count,
                ..LocalGuild::default()
            },
        );
    }

    pub async fn add_channel(&self, guild: GuildId, id: ChannelId, name: &str) {
        let mut state = self.state.write().await;
        if let Some(g) = state.guilds.get_mut(&guild) {
            g.channels.insert(id, name.to_string());
        }
    }

    /// Grant the message-management capability to a member.
    pub async fn grant_moderator(&self, guild: GuildId, user: UserId) {
        let mut state = self.state.write().await;
        if let Some(g) = state.guilds.get_mut(&guild) {
            g.moderators.insert(user);
        }
    }

    /// Make delete calls fail with `CapabilityDenied`.
    pub async fn deny_deletes(&self) {
        self.state.write().await.deny_deletes = true;
    }

    /// Make timeout calls fail with `CapabilityDenied`.
    pub async fn deny_timeouts(&self) {
        self.state.write().await.deny_timeouts = true;
    }

    /// Make send calls fail with `CapabilityDenied`.
    pub async fn deny_sends(&self) {
        self.state.write().await.deny_sends = true;
    }

    /// Record an inbound message into channel history (the platform does
    /// this for real adapters; the driver calls it before `handle_message`).
    pub async fn record_message(&self, message: ChatMessage) {
        let mut state = self.state.write().await;
        let history = state.history.entry(message.channel).or_default();
        history.push_front(message);
        history.truncate(HISTORY_KEEP);
    }

    /// Allocate a fresh message id.
    pub async fn next_message_id(&self) -> MessageId {
        let mut state = self.state.write().await;
        state.next_message_id += 1;
        MessageId(state.next_message_id)
    }

    /// Drain all recorded side effects.
    pub async fn take_effects(&self) -> Vec<Effect> {
        std::mem::take(&mut self.state.write().await.effects)
    }

    /// Snapshot of recorded side effects without draining.
    pub async fn effects(&self) -> Vec<Effect> {
        self.state.read().await.effects.clone()
    }
}

#[async_trait]
impl ChatGateway for LocalGateway {
    fn bot_user(&self) -> UserId {
        self.bot
    }

    async fn guild(&self, id: GuildId) -> Result<GuildInfo, PlatformError> {
        let state = self.state.read().await;
        state
            .guilds
            .get(&id)
            .map(|g| GuildInfo {
                id,
                name: g.name.clone(),
                member_count: g.member_count,
            })
            .ok_or(PlatformError::NotFound {
                what: "guild",
                id: id.to_string(),
            })
    }

    async fn channel(
        &self,
        guild: GuildId,
        id: ChannelId,
    ) -> Result<ChannelInfo, PlatformError> {
        let state = self.state.read().await;
        state
            .guilds
            .get(&guild)
            .and_then(|g| g.channels.get(&id))
            .map(|name| ChannelInfo {
                id,
                guild,
                name: name.clone(),
            })
            .ok_or(PlatformError::NotFound {
                what: "channel",
                id: id.to_string(),
            })
    }

    async fn member_can_manage_messages(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<bool, PlatformError> {
        if user == self.bot {
            return Ok(true);
        }
        let state = self.state.read().await;
        let g = state.guilds.get(&guild).ok_or(PlatformError::NotFound {
            what: "guild",
            id: guild.to_string(),
        })?;
        Ok(g.moderators.contains(&user))
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        if state.deny_deletes {
            return Err(PlatformError::CapabilityDenied {
                action: "delete_message",
            });
        }
        let history = state.history.entry(channel).or_default();
        let before = history.len();
        history.retain(|m| m.id != message);
        if history.len() == before {
            return Err(PlatformError::NotFound {
                what: "message",
                id: message.to_string(),
            });
        }
        state.effects.push(Effect::Deleted { channel, message });
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let mut state = self.state.write().await;
        if state.deny_sends {
            return Err(PlatformError::CapabilityDenied {
                action: "send_message",
            });
        }
        state.next_message_id += 1;
        let id = MessageId(state.next_message_id);
        state.effects.push(Effect::Sent {
            channel,
            content: content.to_string(),
        });
        Ok(id)
    }

    async fn send_notice(
        &self,
        channel: ChannelId,
        content: &str,
        delete_after: Duration,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        if state.deny_sends {
            return Err(PlatformError::CapabilityDenied {
                action: "send_notice",
            });
        }
        state.effects.push(Effect::Notice {
            channel,
            content: content.to_string(),
            delete_after,
        });
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        duration: Duration,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        if state.deny_timeouts {
            return Err(PlatformError::CapabilityDenied {
                action: "timeout_member",
            });
        }
        if !state.guilds.contains_key(&guild) {
            return Err(PlatformError::NotFound {
                what: "guild",
                id: guild.to_string(),
            });
        }
        state.effects.push(Effect::Timeout {
            guild,
            user,
            duration,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        let state = self.state.read().await;
        Ok(state
            .history
            .get(&channel)
            .map(|h| h.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn guild_count(&self) -> usize {
        self.state.read().await.guilds.len()
    }

    async fn member_count(&self) -> usize {
        self.state
            .read()
            .await
            .guilds
            .values()
            .map(|g| g.member_count)
            .sum()
    }
}
