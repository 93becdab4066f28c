//! The single execution path for every command, whatever its origin.

use std::sync::Arc;

use tracing::debug;

use crate::bridge::Metrics;
use crate::commands::invocation::Invocation;
use crate::commands::registry::{CommandContext, CommandRegistry};
use crate::error::DispatchError;
use crate::platform::ChatGateway;
use crate::rules::RuleStore;

/// Resolves and executes invocations against the registry.
pub struct CommandPipeline {
    registry: Arc<CommandRegistry>,
    ctx: CommandContext,
}

impl CommandPipeline {
    pub fn new(
        registry: Arc<CommandRegistry>,
        gateway: Arc<dyn ChatGateway>,
        rules: Arc<RuleStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            ctx: CommandContext {
                gateway,
                rules,
                metrics,
            },
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolve the command and run it; counts a successful run.
    pub async fn execute(&self, inv: &Invocation) -> Result<(), DispatchError> {
        let command = self
            .registry
            .resolve(&inv.command)
            .ok_or_else(|| DispatchError::UnknownCommand(inv.command.clone()))?;

        debug!(command = %inv.command, origin = ?inv.origin, "Executing command");
        command.execute(inv, &self.ctx).await?;
        self.ctx.metrics.record_command();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::commands::invocation::Origin;
    use crate::platform::{ChannelId, Effect, GuildId, LocalGateway, UserId};

    fn invocation(command: &str, args: Vec<String>, author: UserId) -> Invocation {
        Invocation {
            guild: GuildId(1),
            channel: ChannelId(5),
            author,
            origin: Origin::Remote,
            text: format!(">{command}"),
            command: command.to_string(),
            args,
        }
    }

    async fn pipeline() -> (CommandPipeline, Arc<LocalGateway>, Arc<Metrics>) {
        let gateway = Arc::new(LocalGateway::new(UserId(1)));
        gateway.add_guild(GuildId(1), "guild", 10).await;
        gateway.add_channel(GuildId(1), ChannelId(5), "general").await;
        let metrics = Arc::new(Metrics::new());
        let pipeline = CommandPipeline::new(
            Arc::new(CommandRegistry::with_builtins()),
            gateway.clone() as Arc<dyn ChatGateway>,
            Arc::new(RuleStore::new()),
            metrics.clone(),
        );
        (pipeline, gateway, metrics)
    }

    #[tokio::test]
    async fn executing_ping_sends_and_counts() {
        let (pipeline, gateway, metrics) = pipeline().await;
        pipeline
            .execute(&invocation("ping", vec![], UserId(1)))
            .await
            .unwrap();
        assert_eq!(metrics.commands_run(), 1);
        let effects = gateway.take_effects().await;
        assert!(matches!(
            &effects[0],
            Effect::Sent { content, .. } if content.contains("Pong")
        ));
    }

    #[tokio::test]
    async fn unknown_command_is_reported_not_counted() {
        let (pipeline, _gateway, metrics) = pipeline().await;
        let err = pipeline
            .execute(&invocation("frobnicate", vec![], UserId(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(_)));
        assert_eq!(metrics.commands_run(), 0);
    }

    #[tokio::test]
    async fn failed_command_is_not_counted() {
        let (pipeline, _gateway, metrics) = pipeline().await;
        // automod requires the manage-messages capability; user 9 lacks it
        let err = pipeline
            .execute(&invocation("automod", vec![], UserId(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));
        assert_eq!(metrics.commands_run(), 0);
    }
}
