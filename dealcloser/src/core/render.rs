//! Template rendering: channel + context to draft text.
//!
//! Templates are plain-text minijinja documents with named placeholders and
//! loops over the pain-point and benefit lists. Nothing is escaped. Only a
//! subset of channels ships a template; rendering any other channel fails with
//! [`DealError::UnsupportedChannel`].

use minijinja::{Environment, context};
use tracing::debug;

use crate::core::channel::{ChannelId, rule_for};
use crate::core::context::OutreachContext;
use crate::error::DealError;

const EMAIL_TEMPLATE: &str = include_str!("../templates/email.txt");
const LINKEDIN_TEMPLATE: &str = include_str!("../templates/linkedin.txt");
const TELEGRAM_TEMPLATE: &str = include_str!("../templates/telegram.txt");
const INSTAGRAM_TEMPLATE: &str = include_str!("../templates/instagram.txt");

/// Offer phrase used by templates when the caller leaves the offer empty.
const FALLBACK_OFFER: &str = "our solution";

/// Channels with a built-in template.
pub const TEMPLATE_CHANNELS: [ChannelId; 4] = [
    ChannelId::Email,
    ChannelId::Linkedin,
    ChannelId::Telegram,
    ChannelId::Instagram,
];

fn builtin_source(channel: ChannelId) -> Option<&'static str> {
    match channel {
        ChannelId::Email => Some(EMAIL_TEMPLATE),
        ChannelId::Linkedin => Some(LINKEDIN_TEMPLATE),
        ChannelId::Telegram => Some(TELEGRAM_TEMPLATE),
        ChannelId::Instagram => Some(INSTAGRAM_TEMPLATE),
        ChannelId::Whatsapp | ChannelId::Dm => None,
    }
}

/// Template engine wrapper around minijinja.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Renderer with the embedded templates only.
    pub fn builtin() -> Self {
        let mut env = new_environment();
        for channel in TEMPLATE_CHANNELS {
            if let Some(source) = builtin_source(channel) {
                env.add_template(channel.as_str(), source)
                    .expect("built-in template should be valid");
            }
        }
        Self { env }
    }

    /// Embedded templates, with `overrides` replacing (or adding) the template
    /// of their channel.
    pub fn with_overrides(overrides: Vec<(ChannelId, String)>) -> Result<Self, DealError> {
        let mut renderer = Self::builtin();
        for (channel, source) in overrides {
            debug!(channel = %channel, bytes = source.len(), "template override");
            renderer.env.add_template_owned(channel.as_str(), source)?;
        }
        Ok(renderer)
    }

    pub fn has_template(&self, channel: ChannelId) -> bool {
        self.env.get_template(channel.as_str()).is_ok()
    }

    /// Channels this renderer can serve, in generation order.
    pub fn supported(&self) -> Vec<ChannelId> {
        ChannelId::ALL
            .into_iter()
            .filter(|channel| self.has_template(*channel))
            .collect()
    }

    /// Error for a requested channel this renderer cannot serve.
    pub fn unsupported(&self, requested: &str) -> DealError {
        let supported: Vec<&str> = self
            .supported()
            .into_iter()
            .map(ChannelId::as_str)
            .collect();
        DealError::UnsupportedChannel {
            channel: requested.trim().to_string(),
            supported: supported.join(", "),
        }
    }

    /// Render the channel's template. Deterministic: the same channel and
    /// context always produce the same text.
    pub fn render(&self, channel: ChannelId, context: &OutreachContext) -> Result<String, DealError> {
        let template = self
            .env
            .get_template(channel.as_str())
            .map_err(|_| self.unsupported(channel.as_str()))?;
        let rule = rule_for(channel);
        let offer = if context.offer.is_empty() {
            FALLBACK_OFFER
        } else {
            context.offer.as_str()
        };
        let rendered = template.render(context! {
            channel => channel.as_str(),
            recipient_name => &context.recipient_name,
            company => &context.company,
            handle => &context.handle,
            objective => &context.objective,
            pain_points => &context.pain_points,
            offer => offer,
            benefits => &context.benefits,
            tone => &context.tone,
            sender_name => &context.sender_name,
            use_emojis => context.use_emojis,
            use_linebreaks => context.use_linebreaks,
            cta => rule.cta_line,
        })?;
        Ok(rendered.trim().to_string())
    }
}

fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{ContextDefaults, RawFields, normalize};

    fn sample(channel: &str) -> OutreachContext {
        let raw = RawFields {
            channel: Some(channel.to_string()),
            recipient_name: Some("Dana".to_string()),
            company: Some("Acme".to_string()),
            pain_points: Some("slow replies\nmanual follow-ups\ncold leads".to_string()),
            offer: Some("10-minute demo".to_string()),
            benefits: Some("saves time\nraises reply rate".to_string()),
            ..RawFields::default()
        };
        normalize(&raw, &ContextDefaults::default())
    }

    #[test]
    fn builtin_templates_render_for_every_template_channel() {
        let renderer = TemplateRenderer::builtin();
        for channel in TEMPLATE_CHANNELS {
            let text = renderer
                .render(channel, &sample(channel.as_str()))
                .expect("render");
            assert!(text.contains("Dana"), "{channel}: {text}");
            assert!(text.contains(rule_for(channel).cta_line), "{channel}: {text}");
        }
    }

    #[test]
    fn channels_without_templates_are_unsupported() {
        let renderer = TemplateRenderer::builtin();
        for channel in [ChannelId::Whatsapp, ChannelId::Dm] {
            let err = renderer
                .render(channel, &sample(channel.as_str()))
                .expect_err("no template");
            match err {
                DealError::UnsupportedChannel { channel: name, supported } => {
                    assert_eq!(name, channel.as_str());
                    assert_eq!(supported, "email, linkedin, telegram, instagram");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn lists_render_in_input_order() {
        let text = TemplateRenderer::builtin()
            .render(ChannelId::Email, &sample("email"))
            .expect("render");
        let slow = text.find("- slow replies").expect("first");
        let manual = text.find("- manual follow-ups").expect("second");
        let cold = text.find("- cold leads").expect("third");
        assert!(slow < manual && manual < cold);
        let time = text.find("- saves time").expect("benefit one");
        let rate = text.find("- raises reply rate").expect("benefit two");
        assert!(time < rate);
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = TemplateRenderer::builtin();
        let context = sample("linkedin");
        let first = renderer.render(ChannelId::Linkedin, &context).expect("render");
        let second = renderer.render(ChannelId::Linkedin, &context).expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn nothing_is_escaped() {
        let mut context = sample("email");
        context.offer = "<b>R&D</b> \"audit\"".to_string();
        let text = TemplateRenderer::builtin()
            .render(ChannelId::Email, &context)
            .expect("render");
        assert!(text.contains("<b>R&D</b> \"audit\""));
    }

    #[test]
    fn empty_offer_falls_back_to_generic_phrase() {
        let mut context = sample("email");
        context.offer.clear();
        context.benefits.clear();
        let text = TemplateRenderer::builtin()
            .render(ChannelId::Email, &context)
            .expect("render");
        assert!(text.starts_with("Subject: our solution for Acme"));
        assert!(text.contains("I think our solution could make a real difference at Acme."));
    }

    #[test]
    fn overrides_replace_and_extend_builtins() {
        let renderer = TemplateRenderer::with_overrides(vec![
            (ChannelId::Email, "Mail for {{ recipient_name }}".to_string()),
            (ChannelId::Whatsapp, "Ciao {{ recipient_name }}! {{ cta }}".to_string()),
        ])
        .expect("overrides");
        let text = renderer
            .render(ChannelId::Email, &sample("email"))
            .expect("email");
        assert_eq!(text, "Mail for Dana");
        let text = renderer
            .render(ChannelId::Whatsapp, &sample("whatsapp"))
            .expect("whatsapp");
        assert_eq!(text, format!("Ciao Dana! {}", rule_for(ChannelId::Whatsapp).cta_line));
        assert!(renderer.has_template(ChannelId::Whatsapp));
        assert!(!renderer.has_template(ChannelId::Dm));
    }

    #[test]
    fn broken_override_is_a_template_error() {
        let result = TemplateRenderer::with_overrides(vec![(
            ChannelId::Email,
            "{% for x in %}".to_string(),
        )]);
        assert!(matches!(result, Err(DealError::Template(_))));
    }
}
