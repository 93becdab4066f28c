//! Remote command dispatch.
//!
//! Turns a dashboard `command` frame into a local invocation and runs it
//! through the exact pipeline organic chat commands use. Every failure —
//! unknown guild, channel or command, or a command error — is captured and
//! reported in the response frame; nothing disturbs the bridge session.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::protocol::BotFrame;
use crate::commands::invocation::Invocation;
use crate::commands::pipeline::CommandPipeline;
use crate::commands::prefix::PrefixStore;
use crate::error::DispatchError;
use crate::platform::{ChannelId, ChatGateway, GuildId};

/// Executes remote command requests.
pub struct CommandDispatcher {
    gateway: Arc<dyn ChatGateway>,
    pipeline: Arc<CommandPipeline>,
    prefixes: Arc<PrefixStore>,
}

impl CommandDispatcher {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        pipeline: Arc<CommandPipeline>,
        prefixes: Arc<PrefixStore>,
    ) -> Self {
        Self {
            gateway,
            pipeline,
            prefixes,
        }
    }

    /// Run one remote command and build the response frame.
    pub async fn dispatch(
        &self,
        command: &str,
        guild: GuildId,
        channel: ChannelId,
        args: Vec<String>,
        request_id: Option<Uuid>,
    ) -> BotFrame {
        let result = self.invoke(command, guild, channel, args).await;

        let (success, message) = match result {
            Ok(()) => {
                info!(command, guild = %guild, "Remote command executed");
                (true, "Command executed successfully".to_string())
            }
            Err(e) => {
                warn!(command, guild = %guild, error = %e, "Remote command failed");
                (false, e.to_string())
            }
        };

        BotFrame::CommandResponse {
            command: command.to_string(),
            guild_id: guild,
            success,
            message,
            request_id,
        }
    }

    async fn invoke(
        &self,
        command: &str,
        guild: GuildId,
        channel: ChannelId,
        args: Vec<String>,
    ) -> Result<(), DispatchError> {
        // Resolve the target before synthesizing anything.
        self.gateway
            .guild(guild)
            .await
            .map_err(|_| DispatchError::UnknownGuild(guild))?;
        self.gateway
            .channel(guild, channel)
            .await
            .map_err(|_| DispatchError::UnknownChannel(channel))?;

        let prefix = self.prefixes.get(guild).await;
        let inv = Invocation::remote(
            self.gateway.bot_user(),
            guild,
            channel,
            &prefix,
            command,
            args,
        );
        self.pipeline.execute(&inv).await
    }
}
