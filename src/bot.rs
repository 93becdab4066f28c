//! Message-arrival handling and component wiring.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::automod::Monitor;
use crate::bridge::Metrics;
use crate::commands::{CommandPipeline, Invocation, PrefixStore};
use crate::error::DispatchError;
use crate::platform::{ChatGateway, ChatMessage};

/// The assembled bot: monitor plus command pipeline behind one handler.
pub struct Bot {
    gateway: Arc<dyn ChatGateway>,
    monitor: Arc<Monitor>,
    pipeline: Arc<CommandPipeline>,
    prefixes: Arc<PrefixStore>,
    metrics: Arc<Metrics>,
}

impl Bot {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        monitor: Arc<Monitor>,
        pipeline: Arc<CommandPipeline>,
        prefixes: Arc<PrefixStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            gateway,
            monitor,
            pipeline,
            prefixes,
            metrics,
        }
    }

    /// Handle one inbound message: moderation first, then command parsing.
    ///
    /// Runs to completion before the caller feeds the next message, which
    /// is what preserves per-user ordering.
    pub async fn handle_message(&self, msg: &ChatMessage) {
        if msg.author == self.gateway.bot_user() || msg.author_is_bot {
            return;
        }
        self.metrics.record_message();

        let privileged = self
            .gateway
            .member_can_manage_messages(msg.guild, msg.author)
            .await
            .unwrap_or(false);

        if let Some(event) = self.monitor.inspect(msg, privileged).await {
            // the message was consumed (deleted); don't also run it as a command
            debug!(category = %event.category, "Message consumed by automod");
            return;
        }

        let prefix = self.prefixes.get(msg.guild).await;
        let Some(inv) = Invocation::from_message(msg, &prefix) else {
            return;
        };

        match self.pipeline.execute(&inv).await {
            Ok(()) => {}
            // unknown names are just chatter that happened to start with the prefix
            Err(DispatchError::UnknownCommand(name)) => {
                debug!(command = %name, "Ignoring unknown command")
            }
            Err(e) => {
                warn!(command = %inv.command, error = %e, "Command failed");
                let _ = self
                    .gateway
                    .send_notice(
                        msg.channel,
                        &format!("Command failed: {e}"),
                        std::time::Duration::from_secs(10),
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::automod::ActionExecutor;
    use crate::commands::CommandRegistry;
    use crate::config::ExecutorConfig;
    use crate::platform::{
        ChannelId, ChatMessage, Effect, GuildId, LocalGateway, MessageId, UserId,
    };
    use crate::rules::{RuleStore, RulesPatch};

    const BOT_USER: UserId = UserId(1);

    async fn bot() -> (Bot, Arc<LocalGateway>, Arc<Metrics>, Arc<RuleStore>) {
        let gateway = Arc::new(LocalGateway::new(BOT_USER));
        gateway.add_guild(GuildId(1), "guild", 10).await;
        gateway.add_channel(GuildId(1), ChannelId(5), "general").await;
        let rules = Arc::new(RuleStore::new());
        let metrics = Arc::new(Metrics::new());
        let executor = Arc::new(ActionExecutor::new(
            gateway.clone() as Arc<dyn ChatGateway>,
            ExecutorConfig::default(),
        ));
        let monitor = Arc::new(Monitor::new(rules.clone(), executor));
        let pipeline = Arc::new(CommandPipeline::new(
            Arc::new(CommandRegistry::with_builtins()),
            gateway.clone() as Arc<dyn ChatGateway>,
            rules.clone(),
            metrics.clone(),
        ));
        let bot = Bot::new(
            gateway.clone() as Arc<dyn ChatGateway>,
            monitor,
            pipeline,
            Arc::new(PrefixStore::new(">")),
            metrics.clone(),
        );
        (bot, gateway, metrics, rules)
    }

    fn msg(id: u64, author: UserId, content: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId(id),
            guild: GuildId(1),
            channel: ChannelId(5),
            author,
            content: content.to_string(),
            mention_count: 0,
            author_is_bot: false,
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn prefixed_message_runs_a_command() {
        let (bot, gateway, metrics, _rules) = bot().await;
        bot.handle_message(&msg(1, UserId(2), ">ping")).await;
        assert_eq!(metrics.commands_run(), 1);
        assert_eq!(metrics.message_count(), 1);
        assert!(matches!(
            &gateway.take_effects().await[0],
            Effect::Sent { content, .. } if content.contains("Pong")
        ));
    }

    #[tokio::test]
    async fn own_and_bot_messages_are_ignored() {
        let (bot, _gateway, metrics, _rules) = bot().await;
        bot.handle_message(&msg(1, BOT_USER, ">ping")).await;
        let mut other_bot = msg(2, UserId(3), ">ping");
        other_bot.author_is_bot = true;
        bot.handle_message(&other_bot).await;
        assert_eq!(metrics.message_count(), 0);
        assert_eq!(metrics.commands_run(), 0);
    }

    #[tokio::test]
    async fn moderated_message_is_not_run_as_command() {
        let (bot, gateway, metrics, rules) = bot().await;
        rules
            .apply(
                GuildId(1),
                RulesPatch {
                    banned_words: Some(["ping"].iter().map(|s| s.to_string()).collect()),
                    ..RulesPatch::default()
                },
            )
            .await;
        let m = msg(1, UserId(2), ">ping");
        gateway.record_message(m.clone()).await;
        bot.handle_message(&m).await;

        // deleted by automod, never executed
        assert_eq!(metrics.commands_run(), 0);
        let effects = gateway.take_effects().await;
        assert!(matches!(effects[0], Effect::Deleted { .. }));
    }

    #[tokio::test]
    async fn privileged_author_skips_moderation_but_runs_commands() {
        let (bot, gateway, metrics, rules) = bot().await;
        rules
            .apply(
                GuildId(1),
                RulesPatch {
                    banned_words: Some(["ping"].iter().map(|s| s.to_string()).collect()),
                    ..RulesPatch::default()
                },
            )
            .await;
        gateway.grant_moderator(GuildId(1), UserId(2)).await;
        bot.handle_message(&msg(1, UserId(2), ">ping")).await;
        assert_eq!(metrics.commands_run(), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_silently_ignored() {
        let (bot, gateway, metrics, _rules) = bot().await;
        bot.handle_message(&msg(1, UserId(2), ">wibble")).await;
        assert_eq!(metrics.commands_run(), 0);
        assert!(gateway.take_effects().await.is_empty());
    }

    #[tokio::test]
    async fn command_failure_sends_a_notice() {
        let (bot, gateway, _metrics, _rules) = bot().await;
        gateway.grant_moderator(GuildId(1), UserId(2)).await;
        bot.handle_message(&msg(1, UserId(2), ">purge nope")).await;
        let effects = gateway.take_effects().await;
        assert!(matches!(
            &effects[0],
            Effect::Notice { content, .. } if content.contains("Command failed")
        ));
    }
}
