//! Instruction payloads for the refinement step.
//!
//! [`compose`] turns a normalized context and its channel rule into a
//! deterministic instruction the generation service answers with the final
//! message. [`compose_rewrite`] instead asks the service to polish an existing
//! template draft. Both pin the output language to [`TARGET_LANGUAGE`]
//! regardless of the language of the inputs, and both demand the bare message
//! with no titles or preamble. Nothing checks that the service complies.

use serde::Serialize;

use crate::core::channel::{ChannelId, ChannelRule};
use crate::core::context::OutreachContext;

/// Fixed output language of every generated message.
pub const TARGET_LANGUAGE: &str = "English";

const UNSPECIFIED: &str = "unspecified";

/// System and user instructions for one completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPayload {
    pub system_instruction: String,
    pub user_instruction: String,
}

/// Build the instruction that asks the model to write the message directly.
pub fn compose(context: &OutreachContext, rule: &ChannelRule) -> PromptPayload {
    let lb = if context.use_linebreaks { "\n" } else { " " };
    let channel = rule.channel;

    let emoji_hint = if context.use_emojis {
        "You may use 1-2 relevant emojis (never forced)."
    } else {
        "Do not use emojis."
    };

    let mut output = String::from(
        "Output: provide ONLY the final message text to send, with no preamble or titles.",
    );
    if channel == ChannelId::Instagram {
        output.push_str(" Open with a strong hook on the first line.");
    }
    if matches!(channel, ChannelId::Telegram | ChannelId::Whatsapp) {
        output.push_str(" Make replying trivially easy.");
    }

    let lines = [
        format!(
            "You are a copywriter. Write an outreach message for the {channel} channel. \
             Always write in {TARGET_LANGUAGE}, whatever the language of the details below."
        ),
        format!(
            "Recipient profile: {}.",
            context.handle.as_deref().unwrap_or(UNSPECIFIED)
        ),
        format!(
            "Objective: {}.",
            context.objective.as_deref().unwrap_or(UNSPECIFIED)
        ),
        format!(
            "Recipient: {} at {}.",
            context.recipient_name, context.company
        ),
        format!("Pain points: {}.", list_or_unspecified(&context.pain_points)),
        format!("Offer: {}.", or_unspecified(&context.offer)),
        format!("Benefits: {}.", list_or_unspecified(&context.benefits)),
        String::new(),
        format!(
            "Style rules: {}; {}; {}. {emoji_hint}",
            rule.style, rule.length, rule.cta
        ),
        format!(
            "Tone: {}. Sign off as {}.",
            context.tone, context.sender_name
        ),
        "Formatting: use short lines designed for smartphones. Avoid long sentences. \
         Avoid excessive jargon."
            .to_string(),
        output,
        String::new(),
        "Where it helps, separate lines with line breaks for mobile readability.".to_string(),
    ];

    PromptPayload {
        system_instruction: format!(
            "You are a concise, practical writing assistant. You always answer in {TARGET_LANGUAGE}."
        ),
        user_instruction: lines.join(lb),
    }
}

/// Build the instruction that asks the model to polish a template draft.
pub fn compose_rewrite(draft: &str, rule: &ChannelRule) -> PromptPayload {
    PromptPayload {
        system_instruction: format!(
            "You refine outreach copy. Keep it concise, use a US business tone, \
             include one clear CTA, and follow the etiquette of the specified channel. \
             You always answer in {TARGET_LANGUAGE}."
        ),
        user_instruction: format!(
            "Channel: {}\n\
             Channel rules: {}; {}; {}.\n\
             Refine the following outreach draft. Keep key details. Improve clarity and flow.\n\
             ---\n\
             {}\n\
             ---\n\
             Return only the improved message, in {TARGET_LANGUAGE}.",
            rule.channel,
            rule.style,
            rule.length,
            rule.cta,
            draft.trim()
        ),
    }
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() { UNSPECIFIED } else { value }
}

fn list_or_unspecified(items: &[String]) -> String {
    if items.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        items.join("; ")
    }
}
