//! Applies moderation effects with permission-failure tolerance.
//!
//! Every wrapped platform call degrades to a no-op on a denied capability or
//! an already-gone target. Nothing here propagates an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::automod::types::ModerationEvent;
use crate::config::ExecutorConfig;
use crate::error::PlatformError;
use crate::platform::{ChannelId, ChatGateway, MessageId};
use crate::rules::{GuildRules, RuleCategory};

/// Executes the effect sequence for a triggered moderation event.
pub struct ActionExecutor {
    gateway: Arc<dyn ChatGateway>,
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(gateway: Arc<dyn ChatGateway>, config: ExecutorConfig) -> Self {
        Self { gateway, config }
    }

    /// Apply the per-category effect sequence for one event.
    pub async fn apply(&self, rules: &GuildRules, event: &ModerationEvent) {
        match event.category {
            RuleCategory::InviteLinks => {
                self.delete(event.channel, event.message).await;
                self.warn_channel(
                    event.channel,
                    &format!(
                        "<@{}> Invite links are not allowed in this server!",
                        event.user
                    ),
                )
                .await;
            }
            RuleCategory::BannedWords => {
                self.delete(event.channel, event.message).await;
                self.warn_channel(
                    event.channel,
                    &format!(
                        "<@{}> Your message was removed for containing inappropriate language.",
                        event.user
                    ),
                )
                .await;
            }
            RuleCategory::RateSpam => {
                self.timeout(event, self.config.rate_timeout).await;
                self.purge_recent(event).await;
                self.warn_channel(
                    event.channel,
                    &format!(
                        "<@{}> has been timed out for {} for spamming.",
                        event.user,
                        human_duration(self.config.rate_timeout)
                    ),
                )
                .await;
            }
            RuleCategory::RepeatSpam => {
                self.delete(event.channel, event.message).await;
                self.warn_channel(
                    event.channel,
                    &format!(
                        "<@{}> Please don't send the same message repeatedly.",
                        event.user
                    ),
                )
                .await;
            }
            RuleCategory::MentionSpam => {
                self.delete(event.channel, event.message).await;
                self.timeout(event, self.config.mention_timeout).await;
                self.warn_channel(
                    event.channel,
                    &format!(
                        "<@{}> has been timed out for {} for mention spam.",
                        event.user,
                        human_duration(self.config.mention_timeout)
                    ),
                )
                .await;
            }
        }
        self.log_action(rules, event).await;
    }

    async fn delete(&self, channel: ChannelId, message: MessageId) {
        if let Err(e) = self.gateway.delete_message(channel, message).await {
            tolerate("delete message", &e);
        }
    }

    async fn timeout(&self, event: &ModerationEvent, duration: Duration) {
        let reason = format!("automod: {} detected", event.category);
        if let Err(e) = self
            .gateway
            .timeout_member(event.guild, event.user, duration, &reason)
            .await
        {
            tolerate("timeout member", &e);
        }
    }

    async fn warn_channel(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self
            .gateway
            .send_notice(channel, text, self.config.warn_ttl)
            .await
        {
            tolerate("send warning", &e);
        }
    }

    /// Best-effort deletion of the offender's messages from the recent
    /// channel history, bounded to the purge window before the trigger.
    async fn purge_recent(&self, event: &ModerationEvent) {
        let history = match self.gateway.recent_messages(event.channel, 10).await {
            Ok(history) => history,
            Err(e) => {
                tolerate("fetch history", &e);
                return;
            }
        };
        let window = chrono::Duration::from_std(self.config.purge_window)
            .unwrap_or_else(|_| chrono::Duration::seconds(10));
        for msg in history {
            if msg.author == event.user && event.at.signed_duration_since(msg.sent_at) <= window {
                self.delete(event.channel, msg.id).await;
            }
        }
    }

    /// Post a log entry to the guild's configured log channel, if any.
    async fn log_action(&self, rules: &GuildRules, event: &ModerationEvent) {
        let Some(log_channel) = rules.log_channel else {
            return;
        };
        let entry = format!(
            "[automod] {} — user <@{}> in <#{}> | evidence: {}",
            event.category, event.user, event.channel, event.evidence
        );
        if let Err(e) = self.gateway.send_message(log_channel, &entry).await {
            tolerate("post log entry", &e);
        }
    }
}

/// Log a platform failure at the right level and swallow it.
fn tolerate(action: &str, e: &PlatformError) {
    match e {
        PlatformError::CapabilityDenied { .. } => {
            warn!(action, error = %e, "Moderation action skipped")
        }
        PlatformError::NotFound { .. } => {
            debug!(action, error = %e, "Moderation target already gone")
        }
        other => error!(action, error = %other, "Moderation action failed"),
    }
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs % 60 == 0 && secs >= 60 {
        let mins = secs / 60;
        format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else {
        format!("{secs} seconds")
    }
}
