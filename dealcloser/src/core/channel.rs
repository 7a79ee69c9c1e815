//! Channel rule table.
//!
//! Every messaging surface maps to the stylistic constraints that templates and
//! composed instructions follow. The table is a process-wide constant and
//! lookups are total: anything unrecognized resolves to the generic `dm` rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target messaging surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    Email,
    Linkedin,
    Telegram,
    Instagram,
    Whatsapp,
    Dm,
}

impl ChannelId {
    /// Every known channel, in generation order.
    pub const ALL: [ChannelId; 6] = [
        ChannelId::Email,
        ChannelId::Linkedin,
        ChannelId::Telegram,
        ChannelId::Instagram,
        ChannelId::Whatsapp,
        ChannelId::Dm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelId::Email => "email",
            ChannelId::Linkedin => "linkedin",
            ChannelId::Telegram => "telegram",
            ChannelId::Instagram => "instagram",
            ChannelId::Whatsapp => "whatsapp",
            ChannelId::Dm => "dm",
        }
    }

    /// Parse a caller-supplied identifier (case-insensitive, surrounding
    /// whitespace ignored). Returns `None` for unknown channels.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == wanted)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stylistic constraints for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelRule {
    pub channel: ChannelId,
    /// Tone and structure guidance.
    pub style: &'static str,
    /// Length constraint, phrased for a human or model reader.
    pub length: &'static str,
    /// Call-to-action guidance.
    pub cta: &'static str,
    /// Canonical call-to-action sentence used by the static templates.
    pub cta_line: &'static str,
    /// Advisory character limit. Never enforced, only reported.
    pub max_chars: Option<usize>,
}

static EMAIL: ChannelRule = ChannelRule {
    channel: ChannelId::Email,
    style: "professional tone, clear subject line, short paragraphs",
    length: "max 130 words",
    cta: "close with a clear call-to-action (e.g. \"Could I show you a quick 10-minute demo?\")",
    cta_line: "Could I show you a quick 10-minute demo?",
    max_chars: None,
};

static LINKEDIN: ChannelRule = ChannelRule {
    channel: ChannelId::Linkedin,
    style: "professional but personal, reference their role and company, no hard sell",
    length: "max 80 words",
    cta: "suggest a short call without pressure (e.g. \"Open to a short call next week?\")",
    cta_line: "Open to a short call next week?",
    max_chars: None,
};

static TELEGRAM: ChannelRule = ChannelRule {
    channel: ChannelId::Telegram,
    style: "concise, friendly, avoid complex formatting",
    length: "max 8-10 lines",
    cta: "invite them to a short call or a quick reply",
    cta_line: "Up for a quick 10-minute call, or should I just drop a short summary here?",
    max_chars: None,
};

static INSTAGRAM: ChannelRule = ChannelRule {
    channel: ChannelId::Instagram,
    style: "human tone, strong first line, 1-2 relevant emojis",
    length: "short DM (max 500 characters)",
    cta: "ask a simple \"up for it?\" or \"can I send you 2 lines?\"",
    cta_line: "Can I send you 2 lines on how it works?",
    max_chars: Some(500),
};

static WHATSAPP: ChannelRule = ChannelRule {
    channel: ChannelId::Whatsapp,
    style: "conversational, direct, avoid walls of text",
    length: "max 6-8 lines",
    cta: "ask for a quick yes/no confirmation",
    cta_line: "Would that be useful? A quick yes or no is fine.",
    max_chars: None,
};

static DM: ChannelRule = ChannelRule {
    channel: ChannelId::Dm,
    style: "neutral, suited to DMs on any platform",
    length: "short and readable on mobile",
    cta: "ask an easy-to-answer question",
    cta_line: "Worth a quick chat?",
    max_chars: None,
};

/// Rule for a known channel.
pub fn rule_for(channel: ChannelId) -> &'static ChannelRule {
    match channel {
        ChannelId::Email => &EMAIL,
        ChannelId::Linkedin => &LINKEDIN,
        ChannelId::Telegram => &TELEGRAM,
        ChannelId::Instagram => &INSTAGRAM,
        ChannelId::Whatsapp => &WHATSAPP,
        ChannelId::Dm => &DM,
    }
}

/// Resolve a caller-supplied channel identifier. Unknown identifiers get the
/// generic `dm` rule.
pub fn resolve(channel: &str) -> &'static ChannelRule {
    ChannelId::parse(channel).map_or(&DM, rule_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_channel_has_its_own_rule() {
        for channel in ChannelId::ALL {
            assert_eq!(rule_for(channel).channel, channel);
            assert_eq!(resolve(channel.as_str()).channel, channel);
        }
    }

    #[test]
    fn unknown_channels_fall_back_to_dm() {
        for raw in ["", "signal", "sms", "e-mail", "instagram_dm"] {
            assert_eq!(resolve(raw), &DM, "channel {raw:?}");
        }
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(ChannelId::parse("  Email "), Some(ChannelId::Email));
        assert_eq!(ChannelId::parse("WHATSAPP"), Some(ChannelId::Whatsapp));
        assert_eq!(ChannelId::parse("fax"), None);
    }

    #[test]
    fn email_cta_guidance_quotes_the_template_line() {
        let rule = resolve("email");
        assert!(rule.cta.contains(rule.cta_line));
    }

    #[test]
    fn only_instagram_carries_a_character_limit() {
        let limited: Vec<ChannelId> = ChannelId::ALL
            .into_iter()
            .filter(|channel| rule_for(*channel).max_chars.is_some())
            .collect();
        assert_eq!(limited, vec![ChannelId::Instagram]);
    }
}
