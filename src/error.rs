//! Error types for Sentinel.

use crate::platform::{ChannelId, GuildId};

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors surfaced by the chat platform capability layer.
///
/// Moderation paths swallow `CapabilityDenied` and `NotFound`; command
/// dispatch reports them back to the caller instead.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("missing capability for {action}")]
    CapabilityDenied { action: &'static str },

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// True for the two failure classes the Action Executor tolerates.
    pub fn is_tolerable(&self) -> bool {
        matches!(self, Self::CapabilityDenied { .. } | Self::NotFound { .. })
    }
}

/// Dashboard bridge errors.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("authentication rejected by dashboard: {0}")]
    AuthRejected(String),
}

/// Remote/local command dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("guild not found: {0}")]
    UnknownGuild(GuildId),

    #[error("channel not found: {0}")]
    UnknownChannel(ChannelId),

    #[error("command not found: {0}")]
    UnknownCommand(String),

    #[error("missing permission: {0}")]
    Forbidden(&'static str),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Platform(#[from] PlatformError),

    #[error("{0}")]
    Failed(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
