//! Ordered, short-circuiting message evaluation.
//!
//! Categories run in a fixed order — invite links, banned words, spam
//! (rate then repeat), mention spam — and the first non-exempt match
//! consumes the message. Each category checks its own exempt-channel set;
//! an exemption skips that category only, lower-priority checks still run.

use std::sync::Arc;

use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::automod::activity::{ActivityTracker, RATE_THRESHOLD, RATE_WINDOW_SECS};
use crate::automod::executor::ActionExecutor;
use crate::automod::types::ModerationEvent;
use crate::platform::ChatMessage;
use crate::rules::{GuildRules, RuleCategory, RuleStore};

/// Invite-link pattern, case-insensitive.
const INVITE_PATTERN: &str =
    r"(?i)(discord\.gg|discord\.com/invite|discordapp\.com/invite)/[a-zA-Z0-9]+";

/// Evaluates every inbound message against the guild's rule set.
pub struct Monitor {
    rules: Arc<RuleStore>,
    executor: Arc<ActionExecutor>,
    tracker: Arc<Mutex<ActivityTracker>>,
    invite_re: Regex,
}

impl Monitor {
    pub fn new(rules: Arc<RuleStore>, executor: Arc<ActionExecutor>) -> Self {
        Self {
            rules,
            executor,
            tracker: Arc::new(Mutex::new(ActivityTracker::new())),
            invite_re: Regex::new(INVITE_PATTERN).expect("invite pattern is valid"),
        }
    }

    /// Shared handle to the activity windows, for the sweeper.
    pub fn tracker(&self) -> Arc<Mutex<ActivityTracker>> {
        Arc::clone(&self.tracker)
    }

    /// Evaluate one message; returns the event if a category consumed it.
    ///
    /// Evaluation and enforcement complete before this returns, so per-user
    /// ordering holds as long as the caller awaits message by message.
    pub async fn inspect(
        &self,
        msg: &ChatMessage,
        privileged: bool,
    ) -> Option<ModerationEvent> {
        if msg.author_is_bot || privileged {
            return None;
        }

        let rules = self.rules.get(msg.guild).await;
        if !rules.enabled {
            return None;
        }

        // 1. Invite links
        if rules.block_invites
            && rules.applies(RuleCategory::InviteLinks, msg.channel)
            && self.invite_re.is_match(&msg.content)
        {
            return Some(
                self.enforce(&rules, RuleCategory::InviteLinks, msg, msg.content.clone())
                    .await,
            );
        }

        // 2. Banned words (substring, case-insensitive; empty set disables)
        if !rules.banned_words.is_empty() && rules.applies(RuleCategory::BannedWords, msg.channel)
        {
            let content_lower = msg.content.to_lowercase();
            let matched = rules
                .banned_words
                .iter()
                .find(|w| content_lower.contains(&w.to_lowercase()));
            if let Some(word) = matched {
                let evidence = format!("matched {word:?}: {}", msg.content);
                return Some(
                    self.enforce(&rules, RuleCategory::BannedWords, msg, evidence)
                        .await,
                );
            }
        }

        // 3. Spam: the message is recorded first, then the rate check runs,
        //    and only if it stays quiet does the repeat check run. A rate
        //    cooldown suppresses both until the triggering window ages out.
        if rules.anti_spam && rules.applies(RuleCategory::RateSpam, msg.channel) {
            let decision = {
                let mut tracker = self.tracker.lock().await;
                tracker.record(msg.guild, msg.author, &msg.content, msg.sent_at);

                if tracker.in_rate_cooldown(msg.guild, msg.author, msg.sent_at) {
                    debug!(user = %msg.author, "Spam checks suppressed during cooldown");
                    None
                } else {
                    let count = tracker.rate_count(msg.guild, msg.author, msg.sent_at);
                    if count >= RATE_THRESHOLD {
                        tracker.mark_rate_trigger(msg.guild, msg.author, msg.sent_at);
                        Some((
                            RuleCategory::RateSpam,
                            format!("{count} messages in {RATE_WINDOW_SECS} seconds"),
                        ))
                    } else if tracker.trailing_repeat(msg.guild, msg.author) {
                        tracker.clear_contents(msg.guild, msg.author);
                        Some((RuleCategory::RepeatSpam, msg.content.clone()))
                    } else {
                        None
                    }
                }
            };
            if let Some((category, evidence)) = decision {
                return Some(self.enforce(&rules, category, msg, evidence).await);
            }
        }

        // 4. Mention spam: equality to the max is allowed
        if rules.anti_mention_spam
            && rules.applies(RuleCategory::MentionSpam, msg.channel)
            && msg.mention_count > rules.max_mentions
        {
            let evidence = format!(
                "{} mentions (max {})",
                msg.mention_count, rules.max_mentions
            );
            return Some(
                self.enforce(&rules, RuleCategory::MentionSpam, msg, evidence)
                    .await,
            );
        }

        None
    }

    async fn enforce(
        &self,
        rules: &GuildRules,
        category: RuleCategory,
        msg: &ChatMessage,
        evidence: String,
    ) -> ModerationEvent {
        let event = ModerationEvent::new(
            category,
            msg.guild,
            msg.channel,
            msg.author,
            msg.id,
            evidence,
            msg.sent_at,
        );
        info!(
            category = %category,
            guild = %event.guild,
            user = %event.user,
            "Moderation triggered"
        );
        self.executor.apply(rules, &event).await;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashSet;

    use crate::config::ExecutorConfig;
    use crate::platform::{
        ChannelId, ChatMessage, Effect, GuildId, LocalGateway, MessageId, UserId,
    };
    use crate::rules::RulesPatch;

    const G: GuildId = GuildId(1);
    const CH: ChannelId = ChannelId(5);
    const U: UserId = UserId(2);

    struct Fixture {
        gateway: Arc<LocalGateway>,
        rules: Arc<RuleStore>,
        monitor: Monitor,
        next_id: std::sync::atomic::AtomicU64,
    }

    impl Fixture {
        async fn new() -> Self {
            let gateway = Arc::new(LocalGateway::new(UserId(1)));
            gateway.add_guild(G, "guild", 10).await;
            gateway.add_channel(G, CH, "general").await;
            let rules = Arc::new(RuleStore::new());
            let executor = Arc::new(ActionExecutor::new(
                gateway.clone(),
                ExecutorConfig::default(),
            ));
            Self {
                gateway,
                rules: rules.clone(),
                monitor: Monitor::new(rules, executor),
                next_id: std::sync::atomic::AtomicU64::new(1),
            }
        }

        fn at(&self, secs: i64) -> DateTime<Utc> {
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
        }

        fn msg(&self, content: &str, secs: i64) -> ChatMessage {
            self.msg_in(CH, U, content, secs, 0)
        }

        fn msg_in(
            &self,
            channel: ChannelId,
            author: UserId,
            content: &str,
            secs: i64,
            mentions: u32,
        ) -> ChatMessage {
            let id = self
                .next_id
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            ChatMessage {
                id: MessageId(id),
                guild: G,
                channel,
                author,
                content: content.to_string(),
                mention_count: mentions,
                author_is_bot: false,
                sent_at: self.at(secs),
            }
        }

        async fn inspect(&self, msg: &ChatMessage) -> Option<ModerationEvent> {
            self.monitor.inspect(msg, false).await
        }

        async fn patch(&self, patch: RulesPatch) {
            self.rules.apply(G, patch).await;
        }
    }

    fn words(list: &[&str]) -> Option<HashSet<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn invite_link_is_consumed() {
        let fx = Fixture::new().await;
        let event = fx
            .inspect(&fx.msg("join discord.gg/abc123 now", 0))
            .await
            .expect("invite should trigger");
        assert_eq!(event.category, RuleCategory::InviteLinks);
    }

    #[tokio::test]
    async fn invite_match_is_case_insensitive() {
        let fx = Fixture::new().await;
        assert!(fx.inspect(&fx.msg("DISCORD.GG/AbC", 0)).await.is_some());
        assert!(fx
            .inspect(&fx.msg("discordapp.com/invite/xyz", 1))
            .await
            .is_some());
        assert!(fx.inspect(&fx.msg("discord dot gg slash x", 2)).await.is_none());
    }

    #[tokio::test]
    async fn banned_word_substring_case_insensitive() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            banned_words: words(&["spoiler"]),
            ..RulesPatch::default()
        })
        .await;

        let event = fx
            .inspect(&fx.msg("big SPOILERS ahead", 0))
            .await
            .expect("banned word should trigger");
        assert_eq!(event.category, RuleCategory::BannedWords);
        assert!(fx.inspect(&fx.msg("all clear", 1)).await.is_none());
    }

    #[tokio::test]
    async fn first_matching_category_short_circuits() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            banned_words: words(&["abc123"]),
            ..RulesPatch::default()
        })
        .await;

        // Content matches both invite and banned word; invites rank first.
        let event = fx
            .inspect(&fx.msg("discord.gg/abc123", 0))
            .await
            .unwrap();
        assert_eq!(event.category, RuleCategory::InviteLinks);
    }

    #[tokio::test]
    async fn exempt_channel_skips_category_but_not_lower_ones() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            invite_exempt: Some([CH].into_iter().collect()),
            banned_words: words(&["abc123"]),
            ..RulesPatch::default()
        })
        .await;

        // Invite category is exempt here, so the banned-word category (lower
        // priority) gets its turn and fires instead.
        let event = fx
            .inspect(&fx.msg("discord.gg/abc123", 0))
            .await
            .unwrap();
        assert_eq!(event.category, RuleCategory::BannedWords);
    }

    #[tokio::test]
    async fn same_user_in_non_exempt_channel_is_evaluated() {
        let fx = Fixture::new().await;
        let other = ChannelId(6);
        fx.gateway.add_channel(G, other, "promo").await;
        fx.patch(RulesPatch {
            invite_exempt: Some([other].into_iter().collect()),
            ..RulesPatch::default()
        })
        .await;

        assert!(fx
            .inspect(&fx.msg_in(other, U, "discord.gg/abc", 0, 0))
            .await
            .is_none());
        assert!(fx
            .inspect(&fx.msg_in(CH, U, "discord.gg/abc", 1, 0))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn privileged_and_bot_authors_are_exempt() {
        let fx = Fixture::new().await;
        let msg = fx.msg("discord.gg/abc", 0);
        assert!(fx.monitor.inspect(&msg, true).await.is_none());

        let mut bot_msg = fx.msg("discord.gg/abc", 1);
        bot_msg.author_is_bot = true;
        assert!(fx.monitor.inspect(&bot_msg, false).await.is_none());
    }

    #[tokio::test]
    async fn disabled_guild_skips_everything() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            enabled: Some(false),
            ..RulesPatch::default()
        })
        .await;
        assert!(fx.inspect(&fx.msg("discord.gg/abc", 0)).await.is_none());
    }

    #[tokio::test]
    async fn fifth_message_in_window_triggers_exactly_once() {
        let fx = Fixture::new().await;
        for i in 0..4 {
            assert!(fx.inspect(&fx.msg(&format!("m{i}"), i)).await.is_none());
        }
        let event = fx.inspect(&fx.msg("m4", 4)).await.expect("5th should trigger");
        assert_eq!(event.category, RuleCategory::RateSpam);

        // Cooldown: further traffic does not re-trigger while the
        // triggering timestamps are still inside the 60s bucket.
        for i in 5..20 {
            assert!(fx.inspect(&fx.msg("again", i)).await.is_none());
        }
    }

    #[tokio::test]
    async fn rate_can_retrigger_after_bucket_ages_out() {
        let fx = Fixture::new().await;
        for i in 0..5 {
            fx.inspect(&fx.msg("burst", i)).await;
        }
        // 61s later the cooldown has lapsed; a fresh burst re-triggers.
        for i in 0..4 {
            assert!(fx.inspect(&fx.msg("fresh", 65 + i)).await.is_none());
        }
        let event = fx.inspect(&fx.msg("fresh", 69)).await.unwrap();
        assert_eq!(event.category, RuleCategory::RateSpam);
    }

    #[tokio::test]
    async fn rate_trigger_times_out_and_purges() {
        let fx = Fixture::new().await;
        for i in 0..5 {
            let msg = fx.msg("flood", i);
            fx.gateway.record_message(msg.clone()).await;
            fx.inspect(&msg).await;
        }
        let effects = fx.gateway.take_effects().await;
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Timeout { duration, .. }
                if *duration == std::time::Duration::from_secs(120)
        )));
        // recent flood messages were best-effort deleted
        assert!(effects.iter().filter(|e| matches!(e, Effect::Deleted { .. })).count() >= 5);
    }

    #[tokio::test]
    async fn third_identical_message_triggers_repeat() {
        let fx = Fixture::new().await;
        // spaced out so the rate check stays quiet
        assert!(fx.inspect(&fx.msg("same", 0)).await.is_none());
        assert!(fx.inspect(&fx.msg("same", 10)).await.is_none());
        let event = fx.inspect(&fx.msg("same", 20)).await.expect("triplet");
        assert_eq!(event.category, RuleCategory::RepeatSpam);
    }

    #[tokio::test]
    async fn fourth_identical_needs_a_fresh_triplet() {
        let fx = Fixture::new().await;
        fx.inspect(&fx.msg("same", 0)).await;
        fx.inspect(&fx.msg("same", 10)).await;
        assert!(fx.inspect(&fx.msg("same", 20)).await.is_some());

        // 4th identical: ring was cleared, no trigger
        assert!(fx.inspect(&fx.msg("same", 30)).await.is_none());
        // two more identical complete a new triplet
        assert!(fx.inspect(&fx.msg("same", 40)).await.is_none());
        assert!(fx.inspect(&fx.msg("same", 50)).await.is_some());
    }

    #[tokio::test]
    async fn rate_trigger_skips_repeat_check() {
        let fx = Fixture::new().await;
        // five identical messages inside the rate window: the rate check
        // wins and the repeat check never runs for that message
        for i in 0..4 {
            assert!(fx.inspect(&fx.msg("same", i)).await.is_none());
        }
        let event = fx.inspect(&fx.msg("same", 4)).await.unwrap();
        assert_eq!(event.category, RuleCategory::RateSpam);
    }

    #[tokio::test]
    async fn mention_count_at_max_is_allowed() {
        let fx = Fixture::new().await;
        assert!(fx
            .inspect(&fx.msg_in(CH, U, "hey everyone", 0, 5))
            .await
            .is_none());
        let event = fx
            .inspect(&fx.msg_in(CH, U, "hey everyone", 1, 6))
            .await
            .expect("6 mentions should trigger");
        assert_eq!(event.category, RuleCategory::MentionSpam);
    }

    #[tokio::test]
    async fn mention_exempt_channel_is_skipped() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            mention_exempt: Some([CH].into_iter().collect()),
            ..RulesPatch::default()
        })
        .await;
        assert!(fx
            .inspect(&fx.msg_in(CH, U, "hi", 0, 20))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn spam_exempt_channel_never_rate_triggers() {
        let fx = Fixture::new().await;
        fx.patch(RulesPatch {
            spam_exempt: Some([CH].into_iter().collect()),
            ..RulesPatch::default()
        })
        .await;
        for i in 0..10 {
            assert!(fx.inspect(&fx.msg("flood", i / 2)).await.is_none());
        }
    }
}
