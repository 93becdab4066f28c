//! Built-in command set.
//!
//! Deliberately small — enough to exercise the full pipeline from both
//! origins. Responses go out through the gateway like any other message.

use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::invocation::Invocation;
use crate::commands::registry::{Command, CommandContext};
use crate::error::DispatchError;
use crate::rules::RulesPatch;

/// All built-in commands, registration order.
pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(Ping),
        Arc::new(Info),
        Arc::new(ServerInfo),
        Arc::new(Purge),
        Arc::new(Automod),
    ]
}

/// Latency check.
struct Ping;

#[async_trait]
impl Command for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Check that the bot is responsive"
    }

    async fn execute(
        &self,
        inv: &Invocation,
        ctx: &CommandContext,
    ) -> Result<(), DispatchError> {
        ctx.gateway.send_message(inv.channel, "Pong! 🏓").await?;
        Ok(())
    }
}

/// Process stats.
struct Info;

#[async_trait]
impl Command for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["botinfo"]
    }

    fn description(&self) -> &'static str {
        "Show bot uptime and counters"
    }

    async fn execute(
        &self,
        inv: &Invocation,
        ctx: &CommandContext,
    ) -> Result<(), DispatchError> {
        let stats = ctx.metrics.snapshot(ctx.gateway.as_ref()).await;
        let text = format!(
            "Uptime: {} | Guilds: {} | Users: {} | Commands run: {} | Messages seen: {}",
            format_uptime(stats.uptime),
            stats.guilds,
            stats.users,
            stats.commands_run,
            stats.message_count,
        );
        ctx.gateway.send_message(inv.channel, &text).await?;
        Ok(())
    }
}

/// Current guild summary.
struct ServerInfo;

#[async_trait]
impl Command for ServerInfo {
    fn name(&self) -> &'static str {
        "serverinfo"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["server"]
    }

    fn description(&self) -> &'static str {
        "Show information about this guild"
    }

    async fn execute(
        &self,
        inv: &Invocation,
        ctx: &CommandContext,
    ) -> Result<(), DispatchError> {
        let guild = ctx.gateway.guild(inv.guild).await?;
        let text = format!(
            "{} — {} members (id {})",
            guild.name, guild.member_count, guild.id
        );
        ctx.gateway.send_message(inv.channel, &text).await?;
        Ok(())
    }
}

/// Bulk-delete recent messages in the channel.
struct Purge;

#[async_trait]
impl Command for Purge {
    fn name(&self) -> &'static str {
        "purge"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["clear"]
    }

    fn description(&self) -> &'static str {
        "Delete up to N recent messages (default 10, max 100)"
    }

    async fn execute(
        &self,
        inv: &Invocation,
        ctx: &CommandContext,
    ) -> Result<(), DispatchError> {
        ctx.require_moderator(inv).await?;

        let amount = match inv.args.first() {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DispatchError::Usage("purge [amount]"))?,
            None => 10,
        }
        .clamp(1, 100);

        let history = ctx.gateway.recent_messages(inv.channel, amount).await?;
        let mut deleted = 0usize;
        for msg in history {
            // individual targets may already be gone; keep going
            if ctx.gateway.delete_message(inv.channel, msg.id).await.is_ok() {
                deleted += 1;
            }
        }
        ctx.gateway
            .send_notice(
                inv.channel,
                &format!("Deleted {deleted} messages."),
                std::time::Duration::from_secs(5),
            )
            .await?;
        Ok(())
    }
}

/// Show or toggle this guild's moderation rules.
struct Automod;

#[async_trait]
impl Command for Automod {
    fn name(&self) -> &'static str {
        "automod"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["am"]
    }

    fn description(&self) -> &'static str {
        "Show or toggle automatic moderation (automod [enable|disable])"
    }

    async fn execute(
        &self,
        inv: &Invocation,
        ctx: &CommandContext,
    ) -> Result<(), DispatchError> {
        ctx.require_moderator(inv).await?;

        match inv.args.first().map(String::as_str) {
            None => {
                let rules = ctx.rules.get(inv.guild).await;
                let text = format!(
                    "AutoMod: {} | invites: {} | banned words: {} | anti-spam: {} | \
                     mention limit: {}",
                    on_off(rules.enabled),
                    on_off(rules.block_invites),
                    rules.banned_words.len(),
                    on_off(rules.anti_spam),
                    rules.max_mentions,
                );
                ctx.gateway.send_message(inv.channel, &text).await?;
            }
            Some("enable") | Some("disable") => {
                let enable = inv.args[0] == "enable";
                ctx.rules
                    .apply(
                        inv.guild,
                        RulesPatch {
                            enabled: Some(enable),
                            ..RulesPatch::default()
                        },
                    )
                    .await;
                let text = format!("AutoMod has been {}d for this server.", inv.args[0]);
                ctx.gateway.send_message(inv.channel, &text).await?;
            }
            Some(_) => return Err(DispatchError::Usage("automod [enable|disable]")),
        }
        Ok(())
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn format_uptime(secs: u64) -> String {
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::bridge::Metrics;
    use crate::commands::invocation::Origin;
    use crate::platform::{
        ChannelId, ChatGateway, ChatMessage, Effect, GuildId, LocalGateway, MessageId, UserId,
    };
    use crate::rules::RuleStore;

    const BOT: UserId = UserId(1);

    async fn context() -> (CommandContext, Arc<LocalGateway>) {
        let gateway = Arc::new(LocalGateway::new(BOT));
        gateway.add_guild(GuildId(1), "testers", 25).await;
        gateway.add_channel(GuildId(1), ChannelId(5), "general").await;
        let ctx = CommandContext {
            gateway: gateway.clone() as Arc<dyn ChatGateway>,
            rules: Arc::new(RuleStore::new()),
            metrics: Arc::new(Metrics::new()),
        };
        (ctx, gateway)
    }

    fn inv(command: &str, args: &[&str], author: UserId) -> Invocation {
        Invocation {
            guild: GuildId(1),
            channel: ChannelId(5),
            author,
            origin: Origin::Remote,
            text: format!(">{command}"),
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn serverinfo_reports_guild_summary() {
        let (ctx, gateway) = context().await;
        ServerInfo.execute(&inv("serverinfo", &[], BOT), &ctx).await.unwrap();
        let effects = gateway.take_effects().await;
        assert!(matches!(
            &effects[0],
            Effect::Sent { content, .. } if content.contains("testers") && content.contains("25")
        ));
    }

    #[tokio::test]
    async fn purge_deletes_recent_and_reports() {
        let (ctx, gateway) = context().await;
        for i in 0..3 {
            gateway
                .record_message(ChatMessage {
                    id: MessageId(i),
                    guild: GuildId(1),
                    channel: ChannelId(5),
                    author: UserId(7),
                    content: "noise".to_string(),
                    mention_count: 0,
                    author_is_bot: false,
                    sent_at: Utc::now(),
                })
                .await;
        }
        Purge.execute(&inv("purge", &["2"], BOT), &ctx).await.unwrap();
        let effects = gateway.take_effects().await;
        let deleted = effects
            .iter()
            .filter(|e| matches!(e, Effect::Deleted { .. }))
            .count();
        assert_eq!(deleted, 2);
        assert!(matches!(
            effects.last().unwrap(),
            Effect::Notice { content, .. } if content == "Deleted 2 messages."
        ));
    }

    #[tokio::test]
    async fn purge_rejects_non_numeric_amount() {
        let (ctx, _gateway) = context().await;
        let err = Purge
            .execute(&inv("purge", &["lots"], BOT), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Usage(_)));
    }

    #[tokio::test]
    async fn automod_requires_moderator_for_members() {
        let (ctx, gateway) = context().await;
        let err = Automod
            .execute(&inv("automod", &[], UserId(9)), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));

        gateway.grant_moderator(GuildId(1), UserId(9)).await;
        Automod
            .execute(&inv("automod", &[], UserId(9)), &ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn automod_disable_patches_rules() {
        let (ctx, _gateway) = context().await;
        Automod
            .execute(&inv("automod", &["disable"], BOT), &ctx)
            .await
            .unwrap();
        assert!(!ctx.rules.get(GuildId(1)).await.enabled);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(62), "1m 02s");
        assert_eq!(format_uptime(3723), "1h 02m 03s");
    }
}
