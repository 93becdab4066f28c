//! Wire message taxonomy.
//!
//! One JSON object per frame, discriminated by a required `type` field,
//! snake_case throughout. Unknown types decode to an error; the session
//! logs and drops the frame without closing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::platform::{ChannelId, GuildId};

/// Stats payload carried by a `bot_stats` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    /// Seconds since process start.
    pub uptime: u64,
    pub guilds: usize,
    pub users: usize,
    pub commands_run: u64,
    pub message_count: u64,
    pub is_online: bool,
}

/// Frames the bot sends to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotFrame {
    BotAuth {
        token: String,
    },
    BotStats {
        stats: BotStats,
    },
    Heartbeat,
    Pong,
    CommandResponse {
        command: String,
        guild_id: GuildId,
        success: bool,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Uuid>,
    },
    SettingsUpdateResponse {
        settings_type: String,
        guild_id: GuildId,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Frames the dashboard sends to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardFrame {
    Ping,
    Command {
        command: String,
        guild_id: GuildId,
        channel_id: ChannelId,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Uuid>,
    },
    UpdateSettings {
        settings_type: String,
        guild_id: GuildId,
        #[serde(default)]
        settings: serde_json::Value,
    },
    /// Authentication rejection observed after the handshake.
    AuthError {
        #[serde(default)]
        message: Option<String>,
    },
}

impl DashboardFrame {
    /// Decode one inbound frame.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text).map_err(|e| BridgeError::Protocol(e.to_string()))
    }
}

impl BotFrame {
    /// Encode for the wire.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("bot frames always serialize")
    }
}
