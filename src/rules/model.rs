//! Guild rule set and the partial patch merged into it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::platform::ChannelId;

/// The ordered rule categories the monitor evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    InviteLinks,
    BannedWords,
    RateSpam,
    RepeatSpam,
    MentionSpam,
}

impl RuleCategory {
    /// Short label used in log entries and timeout reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InviteLinks => "invite link",
            Self::BannedWords => "banned word",
            Self::RateSpam => "message spam",
            Self::RepeatSpam => "repeated messages",
            Self::MentionSpam => "mention spam",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Effective moderation configuration for one guild.
///
/// Never absent: the store materializes a default instance on first lookup,
/// so callers never handle a missing-rules case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildRules {
    /// Master switch for the whole moderation engine.
    pub enabled: bool,
    pub block_invites: bool,
    /// Case-insensitive substring matches; empty set disables the category.
    pub banned_words: HashSet<String>,
    pub anti_spam: bool,
    pub anti_mention_spam: bool,
    /// Mention counts equal to this value are allowed; above it triggers.
    pub max_mentions: u32,
    pub invite_exempt: HashSet<ChannelId>,
    pub word_exempt: HashSet<ChannelId>,
    pub spam_exempt: HashSet<ChannelId>,
    pub mention_exempt: HashSet<ChannelId>,
    /// Channel receiving moderation log entries, if any.
    pub log_channel: Option<ChannelId>,
}

impl Default for GuildRules {
    fn default() -> Self {
        Self {
            enabled: true,
            block_invites: true,
            banned_words: HashSet::new(),
            anti_spam: true,
            anti_mention_spam: true,
            max_mentions: 5,
            invite_exempt: HashSet::new(),
            word_exempt: HashSet::new(),
            spam_exempt: HashSet::new(),
            mention_exempt: HashSet::new(),
            log_channel: None,
        }
    }
}

impl GuildRules {
    /// The exempt-channel set consulted before a category runs.
    ///
    /// Both spam checks share one exemption set.
    pub fn exempt_channels(&self, category: RuleCategory) -> &HashSet<ChannelId> {
        match category {
            RuleCategory::InviteLinks => &self.invite_exempt,
            RuleCategory::BannedWords => &self.word_exempt,
            RuleCategory::RateSpam | RuleCategory::RepeatSpam => &self.spam_exempt,
            RuleCategory::MentionSpam => &self.mention_exempt,
        }
    }

    /// Whether a category may evaluate a message in this channel.
    pub fn applies(&self, category: RuleCategory, channel: ChannelId) -> bool {
        !self.exempt_channels(category).contains(&channel)
    }

    /// Merge a partial patch, field by field.
    pub fn merge(&mut self, patch: RulesPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(block_invites) = patch.block_invites {
            self.block_invites = block_invites;
        }
        if let Some(banned_words) = patch.banned_words {
            self.banned_words = banned_words;
        }
        if let Some(anti_spam) = patch.anti_spam {
            self.anti_spam = anti_spam;
        }
        if let Some(anti_mention_spam) = patch.anti_mention_spam {
            self.anti_mention_spam = anti_mention_spam;
        }
        if let Some(max_mentions) = patch.max_mentions {
            self.max_mentions = max_mentions;
        }
        if let Some(invite_exempt) = patch.invite_exempt {
            self.invite_exempt = invite_exempt;
        }
        if let Some(word_exempt) = patch.word_exempt {
            self.word_exempt = word_exempt;
        }
        if let Some(spam_exempt) = patch.spam_exempt {
            self.spam_exempt = spam_exempt;
        }
        if let Some(mention_exempt) = patch.mention_exempt {
            self.mention_exempt = mention_exempt;
        }
        if let Some(log_channel) = patch.log_channel {
            self.log_channel = log_channel;
        }
    }
}

/// Partial update applied through the rule store.
///
/// Arrives as JSON from the dashboard; unknown keys are rejected so a typo
/// in a settings payload fails loudly instead of being silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesPatch {
    pub enabled: Option<bool>,
    pub block_invites: Option<bool>,
    pub banned_words: Option<HashSet<String>>,
    pub anti_spam: Option<bool>,
    pub anti_mention_spam: Option<bool>,
    pub max_mentions: Option<u32>,
    pub invite_exempt: Option<HashSet<ChannelId>>,
    pub word_exempt: Option<HashSet<ChannelId>>,
    pub spam_exempt: Option<HashSet<ChannelId>>,
    pub mention_exempt: Option<HashSet<ChannelId>>,
    /// `Some(None)` clears the log channel, `None` leaves it untouched.
    pub log_channel: Option<Option<ChannelId>>,
}
