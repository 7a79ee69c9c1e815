//! Test-only helpers: a scripted completion transport and request fixtures.

use std::cell::RefCell;

use secrecy::SecretString;

use crate::core::context::{ContextDefaults, RawFields};
use crate::core::prompt::PromptPayload;
use crate::core::render::TemplateRenderer;
use crate::core::types::RefineStrategy;
use crate::error::UpstreamError;
use crate::io::refine::{CompletionRequest, CompletionTransport, RefinementClient};
use crate::pipeline::{Pipeline, RefineSettings};

/// One request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub prompt: PromptPayload,
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Status(u16, String),
}

/// Transport that answers every request with the same scripted reply and
/// records what it was asked.
#[derive(Debug)]
pub struct ScriptedTransport {
    reply: Reply,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    /// Answer every request with `text`.
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    /// Fail every request with an HTTP `status`.
    pub fn failing(status: u16, body: &str) -> Self {
        Self::with_reply(Reply::Status(status, body.to_string()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CompletionTransport for ScriptedTransport {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, UpstreamError> {
        self.calls.borrow_mut().push(RecordedCall {
            api_key: request.api_key.to_string(),
            model: request.model.to_string(),
            temperature: request.temperature,
            prompt: request.prompt.clone(),
        });
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status, body) => Err(UpstreamError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Complete caller fields for `channel`.
pub fn sample_fields(channel: &str) -> RawFields {
    RawFields {
        channel: Some(channel.to_string()),
        recipient_name: Some("Dana".to_string()),
        company: Some("Acme".to_string()),
        handle: Some("dana.builds".to_string()),
        pain_points: Some("slow replies\nmanual follow-ups".to_string()),
        offer: Some("10-minute demo".to_string()),
        benefits: Some("saves time\nraises reply rate".to_string()),
        ..RawFields::default()
    }
}

/// Pipeline with built-in templates and default model settings.
pub fn pipeline<T: CompletionTransport>(transport: T, credential: Option<&str>) -> Pipeline<T> {
    Pipeline::new(
        TemplateRenderer::builtin(),
        RefinementClient::new(
            transport,
            credential.map(|key| SecretString::from(key.to_string())),
            "OPENAI_API_KEY",
        ),
        ContextDefaults::default(),
        RefineSettings {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            strategy: RefineStrategy::Compose,
        },
    )
}
