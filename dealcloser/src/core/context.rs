//! Context normalization: raw caller fields to a canonical [`OutreachContext`].
//!
//! Raw input (CLI flags, data documents) is collected into [`RawFields`] at
//! the boundary and then normalized here. Normalization is pure and never fails.

use serde::{Deserialize, Serialize};

use crate::core::channel::ChannelId;
use crate::error::DealError;

/// Objective used for chat-style channels when the caller leaves it empty.
pub const DEFAULT_OBJECTIVE: &str = "open a brief conversation and set up a micro-call";

const DEFAULT_RECIPIENT: &str = "there";
const DEFAULT_COMPANY: &str = "your company";
const DEFAULT_TONE: &str = "professional";
const DEFAULT_SENDER: &str = "The DealCloser team";

/// Caller-supplied fields before normalization. Multi-line fields are kept as
/// newline-delimited text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFields {
    pub channel: Option<String>,
    pub recipient_name: Option<String>,
    pub company: Option<String>,
    pub handle: Option<String>,
    pub objective: Option<String>,
    pub pain_points: Option<String>,
    pub offer: Option<String>,
    pub benefits: Option<String>,
    pub tone: Option<String>,
    pub sender_name: Option<String>,
    pub use_emojis: bool,
    pub use_linebreaks: bool,
}

impl RawFields {
    /// Layer `overrides` on top of `self`: any field present in `overrides`
    /// wins, flags are combined.
    pub fn overlay(self, overrides: RawFields) -> RawFields {
        RawFields {
            channel: overrides.channel.or(self.channel),
            recipient_name: overrides.recipient_name.or(self.recipient_name),
            company: overrides.company.or(self.company),
            handle: overrides.handle.or(self.handle),
            objective: overrides.objective.or(self.objective),
            pain_points: overrides.pain_points.or(self.pain_points),
            offer: overrides.offer.or(self.offer),
            benefits: overrides.benefits.or(self.benefits),
            tone: overrides.tone.or(self.tone),
            sender_name: overrides.sender_name.or(self.sender_name),
            use_emojis: self.use_emojis || overrides.use_emojis,
            use_linebreaks: self.use_linebreaks || overrides.use_linebreaks,
        }
    }
}

/// Canonical, strongly typed request context.
///
/// `pain_points` and `benefits` are never absent: missing input yields an
/// empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutreachContext {
    pub recipient_name: String,
    pub company: String,
    pub handle: Option<String>,
    pub objective: Option<String>,
    pub pain_points: Vec<String>,
    pub offer: String,
    pub benefits: Vec<String>,
    pub tone: String,
    pub sender_name: String,
    pub use_emojis: bool,
    pub use_linebreaks: bool,
}

/// Configured defaults that are not fixed phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDefaults {
    /// Sender identity when the caller does not name one.
    pub sender_name: String,
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            sender_name: DEFAULT_SENDER.to_string(),
        }
    }
}

/// Normalize raw fields into an [`OutreachContext`].
pub fn normalize(raw: &RawFields, defaults: &ContextDefaults) -> OutreachContext {
    let channel = raw.channel.as_deref().and_then(ChannelId::parse);
    let objective = text(&raw.objective).or_else(|| {
        channel
            .filter(|channel| wants_default_objective(*channel))
            .map(|_| DEFAULT_OBJECTIVE.to_string())
    });

    OutreachContext {
        recipient_name: text(&raw.recipient_name).unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
        company: text(&raw.company).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
        handle: text(&raw.handle).map(|handle| normalize_handle(&handle)),
        objective,
        pain_points: split_lines(raw.pain_points.as_deref().unwrap_or_default()),
        offer: text(&raw.offer).unwrap_or_default(),
        benefits: split_lines(raw.benefits.as_deref().unwrap_or_default()),
        tone: text(&raw.tone).unwrap_or_else(|| DEFAULT_TONE.to_string()),
        sender_name: text(&raw.sender_name)
            .unwrap_or_else(|| defaults.sender_name.trim().to_string()),
        use_emojis: raw.use_emojis,
        use_linebreaks: raw.use_linebreaks,
    }
}

fn wants_default_objective(channel: ChannelId) -> bool {
    matches!(
        channel,
        ChannelId::Telegram | ChannelId::Instagram | ChannelId::Whatsapp | ChannelId::Dm
    )
}

/// Trimmed, non-empty text or `None`.
fn text(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Split a multi-line field into trimmed, non-blank lines, preserving order.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix a bare username with `@`. Already-prefixed handles and Instagram
/// profile URLs are left alone, so the operation is idempotent.
pub fn normalize_handle(handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with('@') || handle.to_ascii_lowercase().contains("instagram.com") {
        handle.to_string()
    } else {
        format!("@{handle}")
    }
}

/// Caller-boundary check run before any model refinement: the offer and at
/// least one benefit must be present.
pub fn require_offer(raw: &RawFields) -> Result<(), DealError> {
    if text(&raw.offer).is_none() {
        return Err(DealError::InvalidInput {
            field: "offer",
            reason: "an offer is required for model refinement".to_string(),
        });
    }
    if split_lines(raw.benefits.as_deref().unwrap_or_default()).is_empty() {
        return Err(DealError::InvalidInput {
            field: "benefits",
            reason: "at least one benefit is required for model refinement".to_string(),
        });
    }
    Ok(())
}
