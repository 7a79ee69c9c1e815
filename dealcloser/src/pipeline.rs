//! Orchestration of one generation request.
//!
//! Caller fields are validated and normalized at the boundary
//! ([`Pipeline::prepare`]), turned into text by the template or by the
//! generation service ([`Pipeline::generate`]), and handed to the output sink.
//! A refinement failure aborts the request; it never degrades to the template
//! draft.

use std::io::Write;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::channel::{ChannelId, ChannelRule, resolve};
use crate::core::context::{ContextDefaults, RawFields, normalize, require_offer};
use crate::core::prompt::{compose, compose_rewrite};
use crate::core::render::TemplateRenderer;
use crate::core::types::{GenerationRequest, GenerationResult, Mode, RefineStrategy};
use crate::error::DealError;
use crate::io::refine::{CompletionTransport, RefinementClient};
use crate::io::sink::{Destination, OutputSink, Receipt};

/// Channel used when the caller does not name one.
pub const DEFAULT_CHANNEL: &str = "email";

/// Model settings for refinement requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineSettings {
    pub model: String,
    pub temperature: f32,
    pub strategy: RefineStrategy,
}

impl RefineSettings {
    pub fn validate(&self) -> Result<(), DealError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DealError::InvalidInput {
                field: "temperature",
                reason: format!("must be within [0, 1], got {}", self.temperature),
            });
        }
        if self.model.trim().is_empty() {
            return Err(DealError::InvalidInput {
                field: "model",
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

/// The message-composition pipeline.
pub struct Pipeline<T> {
    renderer: TemplateRenderer,
    refiner: RefinementClient<T>,
    defaults: ContextDefaults,
    settings: RefineSettings,
}

impl<T: CompletionTransport> Pipeline<T> {
    pub fn new(
        renderer: TemplateRenderer,
        refiner: RefinementClient<T>,
        defaults: ContextDefaults,
        settings: RefineSettings,
    ) -> Self {
        Self {
            renderer,
            refiner,
            defaults,
            settings,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Whether requests in `mode` go through a static template.
    fn needs_template(&self, mode: Mode) -> bool {
        match mode {
            Mode::Template => true,
            Mode::LlmRefine => self.settings.strategy == RefineStrategy::Rewrite,
        }
    }

    /// Channels `mode` can serve, in generation order.
    pub fn channels_for(&self, mode: Mode) -> Vec<ChannelId> {
        if self.needs_template(mode) {
            self.renderer.supported()
        } else {
            ChannelId::ALL.to_vec()
        }
    }

    /// Validate caller fields and build a normalized request.
    ///
    /// Refinement requests check the credential first, then the required
    /// offer fields and model settings. Template-backed requests fail here
    /// when the channel has no template, before any text is produced.
    pub fn prepare(&self, raw: &RawFields, mode: Mode) -> Result<GenerationRequest, DealError> {
        let requested = raw
            .channel
            .as_deref()
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
            .unwrap_or(DEFAULT_CHANNEL)
            .to_ascii_lowercase();

        if mode == Mode::LlmRefine {
            self.refiner.ensure_credential()?;
            require_offer(raw)?;
            self.settings.validate()?;
        }
        if self.needs_template(mode) {
            let servable = ChannelId::parse(&requested)
                .is_some_and(|channel| self.renderer.has_template(channel));
            if !servable {
                return Err(self.renderer.unsupported(&requested));
            }
        }

        let context = normalize(raw, &self.defaults);
        let channel = resolve(&requested);
        debug!(
            requested = %requested,
            channel = %channel.channel,
            mode = %mode,
            handle = ?context.handle,
            use_emojis = context.use_emojis,
            use_linebreaks = context.use_linebreaks,
            "request prepared"
        );
        Ok(GenerationRequest {
            requested_channel: requested,
            context,
            channel,
            mode,
        })
    }

    /// Produce the final text for a prepared request.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, DealError> {
        let rule = request.channel;
        let text = match request.mode {
            Mode::Template => self.renderer.render(rule.channel, &request.context)?,
            Mode::LlmRefine => {
                let prompt = match self.settings.strategy {
                    RefineStrategy::Compose => compose(&request.context, rule),
                    RefineStrategy::Rewrite => {
                        let draft = self.renderer.render(rule.channel, &request.context)?;
                        compose_rewrite(&draft, rule)
                    }
                };
                self.refiner
                    .refine(&prompt, &self.settings.model, self.settings.temperature)?
            }
        };
        report_length(rule, &text);

        Ok(GenerationResult {
            text,
            channel: rule.channel,
            generated_at: Utc::now(),
            source_mode: request.mode,
        })
    }

    /// Prepare, generate and persist one request. Nothing reaches the sink
    /// unless generation succeeded.
    pub fn run<W: Write>(
        &self,
        raw: &RawFields,
        mode: Mode,
        sink: &mut OutputSink<W>,
        destination: &Destination,
    ) -> Result<(GenerationResult, Receipt), DealError> {
        let request = self.prepare(raw, mode)?;
        let result = self.generate(&request)?;
        let receipt = sink.persist(&result, destination)?;
        info!(
            channel = %result.channel,
            mode = %result.source_mode,
            path = ?receipt.path,
            "generation complete"
        );
        Ok((result, receipt))
    }
}

/// Length constraints are advisory: an oversized result is reported, not
/// rejected or truncated.
fn report_length(rule: &ChannelRule, text: &str) {
    if let Some(max_chars) = rule.max_chars {
        let chars = text.chars().count();
        if chars > max_chars {
            warn!(
                channel = %rule.channel,
                chars,
                max_chars,
                "generated text exceeds the channel's advisory length"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedTransport, pipeline, sample_fields};

    #[test]
    fn template_mode_never_calls_the_transport() {
        let transport = ScriptedTransport::replying("unused");
        let pipeline = pipeline(&transport, Some("sk-test"));

        let request = pipeline
            .prepare(&sample_fields("email"), Mode::Template)
            .expect("prepare");
        let result = pipeline.generate(&request).expect("generate");

        assert_eq!(result.channel, ChannelId::Email);
        assert_eq!(result.source_mode, Mode::Template);
        assert!(result.text.starts_with("Subject:"));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn missing_channel_defaults_to_email() {
        let transport = ScriptedTransport::replying("unused");
        let pipeline = pipeline(&transport, None);
        let raw = RawFields {
            channel: None,
            ..sample_fields("email")
        };

        let request = pipeline.prepare(&raw, Mode::Template).expect("prepare");
        assert_eq!(request.requested_channel, "email");
        assert_eq!(request.channel.channel, ChannelId::Email);
    }

    #[test]
    fn template_mode_rejects_channels_without_templates() {
        let transport = ScriptedTransport::replying("unused");
        let pipeline = pipeline(&transport, None);

        for channel in ["whatsapp", "dm", "Signal"] {
            let err = pipeline
                .prepare(&sample_fields(channel), Mode::Template)
                .expect_err("unsupported");
            match err {
                DealError::UnsupportedChannel { channel: name, .. } => {
                    assert_eq!(name, channel.to_ascii_lowercase());
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn compose_mode_serves_every_channel_and_falls_back_to_dm() {
        let transport = ScriptedTransport::replying("  Hey Dana!  ");
        let pipeline = pipeline(&transport, Some("sk-test"));

        let request = pipeline
            .prepare(&sample_fields("signal"), Mode::LlmRefine)
            .expect("prepare");
        let result = pipeline.generate(&request).expect("generate");

        assert_eq!(result.text, "Hey Dana!");
        assert_eq!(result.channel, ChannelId::Dm);
        assert_eq!(pipeline.channels_for(Mode::LlmRefine), ChannelId::ALL.to_vec());
        let calls = transport.calls();
        assert!(calls[0].prompt.user_instruction.contains("for the dm channel"));
    }

    #[test]
    fn rewrite_strategy_sends_the_template_draft() {
        let transport = ScriptedTransport::replying("Polished");
        let mut pipeline = pipeline(&transport, Some("sk-test"));
        pipeline.settings.strategy = RefineStrategy::Rewrite;

        let request = pipeline
            .prepare(&sample_fields("telegram"), Mode::LlmRefine)
            .expect("prepare");
        let result = pipeline.generate(&request).expect("generate");

        assert_eq!(result.text, "Polished");
        let draft = pipeline
            .renderer()
            .render(ChannelId::Telegram, &request.context)
            .expect("draft");
        assert!(transport.calls()[0].prompt.user_instruction.contains(&draft));
        assert_eq!(
            pipeline.channels_for(Mode::LlmRefine),
            pipeline.renderer().supported()
        );
    }

    #[test]
    fn refinement_requires_offer_and_benefits() {
        let transport = ScriptedTransport::replying("unused");
        let pipeline = pipeline(&transport, Some("sk-test"));
        let raw = RawFields {
            benefits: None,
            ..sample_fields("email")
        };

        let err = pipeline
            .prepare(&raw, Mode::LlmRefine)
            .expect_err("invalid input");
        assert!(matches!(err, DealError::InvalidInput { field: "benefits", .. }));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn credential_is_checked_before_input() {
        let transport = ScriptedTransport::replying("unused");
        let pipeline = pipeline(&transport, None);

        let err = pipeline
            .prepare(&RawFields::default(), Mode::LlmRefine)
            .expect_err("missing credential");
        assert!(matches!(err, DealError::MissingCredential { .. }));
    }

    #[test]
    fn out_of_range_temperature_is_invalid_input() {
        let transport = ScriptedTransport::replying("unused");
        let mut pipeline = pipeline(&transport, Some("sk-test"));
        pipeline.settings.temperature = 1.2;

        let err = pipeline
            .prepare(&sample_fields("email"), Mode::LlmRefine)
            .expect_err("temperature");
        assert!(matches!(err, DealError::InvalidInput { field: "temperature", .. }));
    }

    #[test]
    fn upstream_failure_aborts_without_output() {
        let transport = ScriptedTransport::failing(503, "overloaded");
        let pipeline = pipeline(&transport, Some("sk-test"));
        let mut sink = OutputSink::new(Vec::new());

        let err = pipeline
            .run(
                &sample_fields("email"),
                Mode::LlmRefine,
                &mut sink,
                &Destination::Display,
            )
            .expect_err("upstream");

        assert!(matches!(err, DealError::Upstream(_)));
        assert!(sink.into_inner().is_empty());
    }
}
