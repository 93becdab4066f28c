//! Process counters feeding `bot_stats` frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::bridge::protocol::BotStats;
use crate::platform::ChatGateway;

/// Uptime start plus the two activity counters.
pub struct Metrics {
    started: Instant,
    commands_run: AtomicU64,
    message_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            commands_run: AtomicU64::new(0),
            message_count: AtomicU64::new(0),
        }
    }

    pub fn record_command(&self) {
        self.commands_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self) {
        self.message_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn commands_run(&self) -> u64 {
        self.commands_run.load(Ordering::Relaxed)
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Full stats snapshot for a `bot_stats` frame.
    pub async fn snapshot(&self, gateway: &dyn ChatGateway) -> BotStats {
        BotStats {
            uptime: self.uptime_secs(),
            guilds: gateway.guild_count().await,
            users: gateway.member_count().await,
            commands_run: self.commands_run(),
            message_count: self.message_count(),
            is_online: true,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
