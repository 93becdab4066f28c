//! Per-user activity windows.
//!
//! One entry per `(guild, user)` pair: a sliding window of message
//! timestamps, a bounded ring of the most recent raw contents, and the
//! rate-trigger cooldown marker. The monitor is the only writer; the
//! sweeper is the only trimmer.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::platform::{GuildId, UserId};

/// Trailing interval the rate check counts over.
pub const RATE_WINDOW_SECS: i64 = 5;
/// Messages within the window at which the rate check fires.
pub const RATE_THRESHOLD: usize = 5;
/// Identical trailing contents at which the repeat check fires.
pub const REPEAT_RUN: usize = 3;
/// Timestamps older than this are aged out.
pub const RETENTION_SECS: i64 = 60;
/// Raw contents kept per user.
pub const CONTENT_KEEP: usize = 5;

#[derive(Debug, Default)]
struct UserActivity {
    timestamps: VecDeque<DateTime<Utc>>,
    recent_contents: VecDeque<String>,
    /// Set when the rate check fires; suppresses the spam checks until the
    /// triggering timestamps have aged out of the retention bucket.
    rate_cooldown: Option<DateTime<Utc>>,
}

/// Result of a sweep pass, for logging.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub dropped_timestamps: usize,
    pub dropped_entries: usize,
}

/// Tracks message activity for every `(guild, user)` pair.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    users: HashMap<(GuildId, UserId), UserActivity>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message: append its timestamp and content.
    pub fn record(&mut self, guild: GuildId, user: UserId, content: &str, at: DateTime<Utc>) {
        let activity = self.users.entry((guild, user)).or_default();
        activity.timestamps.push_back(at);
        activity.recent_contents.push_back(content.to_string());
        while activity.recent_contents.len() > CONTENT_KEEP {
            activity.recent_contents.pop_front();
        }
    }

    /// Timestamps within the trailing rate window, current message included.
    pub fn rate_count(&self, guild: GuildId, user: UserId, at: DateTime<Utc>) -> usize {
        let window = ChronoDuration::seconds(RATE_WINDOW_SECS);
        self.users
            .get(&(guild, user))
            .map(|a| {
                a.timestamps
                    .iter()
                    .filter(|t| at.signed_duration_since(**t) <= window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether the user's rate cooldown is still active at `at`.
    ///
    /// The cooldown expires once the timestamps that triggered it are older
    /// than the retention bucket; an expired marker is cleared here.
    pub fn in_rate_cooldown(&mut self, guild: GuildId, user: UserId, at: DateTime<Utc>) -> bool {
        let Some(activity) = self.users.get_mut(&(guild, user)) else {
            return false;
        };
        match activity.rate_cooldown {
            Some(triggered)
                if at.signed_duration_since(triggered)
                    < ChronoDuration::seconds(RETENTION_SECS) =>
            {
                true
            }
            Some(_) => {
                activity.rate_cooldown = None;
                false
            }
            None => false,
        }
    }

    /// Mark a rate trigger: set the cooldown and age out stale timestamps.
    pub fn mark_rate_trigger(&mut self, guild: GuildId, user: UserId, at: DateTime<Utc>) {
        if let Some(activity) = self.users.get_mut(&(guild, user)) {
            activity.rate_cooldown = Some(at);
            let cutoff = at - ChronoDuration::seconds(RETENTION_SECS);
            activity.timestamps.retain(|t| *t > cutoff);
        }
    }

    /// Whether the user's last `REPEAT_RUN` recorded contents are identical.
    pub fn trailing_repeat(&self, guild: GuildId, user: UserId) -> bool {
        self.users
            .get(&(guild, user))
            .map(|a| {
                let contents = &a.recent_contents;
                if contents.len() < REPEAT_RUN {
                    return false;
                }
                let mut tail = contents.iter().rev().take(REPEAT_RUN);
                let last = tail.next().expect("REPEAT_RUN > 0");
                tail.all(|c| c == last)
            })
            .unwrap_or(false)
    }

    /// Clear the content ring after a repeat trigger so only a fresh
    /// triplet can re-fire.
    pub fn clear_contents(&mut self, guild: GuildId, user: UserId) {
        if let Some(activity) = self.users.get_mut(&(guild, user)) {
            activity.recent_contents.clear();
        }
    }

    /// Trim every window: drop aged-out timestamps, cap content rings,
    /// clear expired cooldowns, and remove entries whose window emptied.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepStats {
        let cutoff = now - ChronoDuration::seconds(RETENTION_SECS);
        let mut stats = SweepStats::default();

        self.users.retain(|_, activity| {
            let before = activity.timestamps.len();
            activity.timestamps.retain(|t| *t > cutoff);
            stats.dropped_timestamps += before - activity.timestamps.len();

            while activity.recent_contents.len() > CONTENT_KEEP {
                activity.recent_contents.pop_front();
            }
            if activity.rate_cooldown.is_some_and(|t| t <= cutoff) {
                activity.rate_cooldown = None;
            }

            let keep = !activity.timestamps.is_empty();
            if !keep {
                stats.dropped_entries += 1;
            }
            keep
        });

        stats
    }

    /// Number of tracked `(guild, user)` pairs.
    pub fn tracked(&self) -> usize {
        self.users.len()
    }
}
