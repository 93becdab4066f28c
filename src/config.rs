//! Configuration types.
//!
//! All settings are read from the environment with sensible defaults, so the
//! bot runs with zero configuration against a local dashboard. Intervals and
//! delays are plain fields so the test suite can shrink them.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// General bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Default command prefix (per-guild overrides live in `PrefixStore`).
    pub prefix: String,
    /// Optional log file path; stderr logging is always on.
    pub log_file: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: ">".to_string(),
            log_file: None,
        }
    }
}

impl BotConfig {
    /// Build from environment variables (`BOT_PREFIX`, `BOT_LOG_FILE`).
    pub fn from_env() -> Self {
        Self {
            prefix: std::env::var("BOT_PREFIX").unwrap_or_else(|_| ">".to_string()),
            log_file: std::env::var("BOT_LOG_FILE").ok(),
        }
    }
}

/// What to do when the dashboard rejects our credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailurePolicy {
    /// Keep reconnecting on the error delay (default).
    Retry,
    /// Stop the bridge task with an error.
    Fatal,
}

impl AuthFailurePolicy {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "fatal" | "exit" => Ok(Self::Fatal),
            other => Err(ConfigError::InvalidValue {
                key: "DASHBOARD_AUTH_POLICY".to_string(),
                message: format!("expected retry|fatal, got {other}"),
            }),
        }
    }
}

/// Dashboard bridge configuration.
#[derive(Debug)]
pub struct BridgeConfig {
    /// WebSocket endpoint of the dashboard.
    pub url: String,
    /// Shared-secret token sent in the `bot_auth` frame.
    pub token: SecretString,
    /// Heartbeat emission interval.
    pub heartbeat_interval: Duration,
    /// Full stats emission interval (also sent once on connect).
    pub stats_interval: Duration,
    /// Reconnect delay after a clean close.
    pub reconnect_delay_close: Duration,
    /// Reconnect delay after any other error.
    pub reconnect_delay_error: Duration,
    /// Policy when the dashboard rejects authentication.
    pub auth_failure_policy: AuthFailurePolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/ws".to_string(),
            token: SecretString::from("sentinel_dashboard_secret".to_string()),
            heartbeat_interval: Duration::from_secs(30),
            stats_interval: Duration::from_secs(300),
            reconnect_delay_close: Duration::from_secs(5),
            reconnect_delay_error: Duration::from_secs(10),
            auth_failure_policy: AuthFailurePolicy::Retry,
        }
    }
}

impl BridgeConfig {
    /// Build from environment variables (`DASHBOARD_URL`, `DASHBOARD_SECRET`,
    /// `DASHBOARD_AUTH_POLICY`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DASHBOARD_URL") {
            config.url = url;
        }
        if let Ok(secret) = std::env::var("DASHBOARD_SECRET") {
            config.token = SecretString::from(secret);
        }
        if let Ok(policy) = std::env::var("DASHBOARD_AUTH_POLICY") {
            config.auth_failure_policy = AuthFailurePolicy::parse(&policy)?;
        }
        Ok(config)
    }
}

/// Action Executor tuning.
///
/// Timeout durations are fixed per category; this struct is the extension
/// point for making them configurable.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Timeout applied on a rate-spam trigger.
    pub rate_timeout: Duration,
    /// Timeout applied on a mention-spam trigger.
    pub mention_timeout: Duration,
    /// How long warning notices stay visible before self-deleting.
    pub warn_ttl: Duration,
    /// How far back to purge a rate-spammer's recent messages.
    pub purge_window: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            rate_timeout: Duration::from_secs(120),
            mention_timeout: Duration::from_secs(600),
            warn_ttl: Duration::from_secs(10),
            purge_window: Duration::from_secs(10),
        }
    }
}

/// Background sweeper tuning.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often the sweep pass runs.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_contract() {
        let config = BridgeConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.stats_interval, Duration::from_secs(300));
        assert_eq!(config.reconnect_delay_close, Duration::from_secs(5));
        assert_eq!(config.reconnect_delay_error, Duration::from_secs(10));
        assert_eq!(config.auth_failure_policy, AuthFailurePolicy::Retry);
    }

    #[test]
    fn auth_policy_parses_known_values() {
        assert_eq!(
            AuthFailurePolicy::parse("retry").unwrap(),
            AuthFailurePolicy::Retry
        );
        assert_eq!(
            AuthFailurePolicy::parse("FATAL").unwrap(),
            AuthFailurePolicy::Fatal
        );
        assert!(AuthFailurePolicy::parse("sometimes").is_err());
    }
}
