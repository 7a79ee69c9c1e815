//! Refinement client for the external text-generation service.
//!
//! The [`CompletionTransport`] trait decouples the pipeline from the actual
//! backend (an OpenAI-compatible chat completions API). Tests use scripted
//! transports that return predetermined text without touching the network.

use std::sync::OnceLock;
use std::time::Instant;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::prompt::PromptPayload;
use crate::error::{DealError, UpstreamError};
use crate::io::config::ApiConfig;

/// Parameters for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub prompt: &'a PromptPayload,
}

/// Abstraction over completion backends.
pub trait CompletionTransport {
    /// Perform exactly one request and return the message text untouched.
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, UpstreamError>;
}

impl<T: CompletionTransport + ?Sized> CompletionTransport for &T {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, UpstreamError> {
        (**self).complete(request)
    }
}

/// Transport that POSTs to `<base_url>/chat/completions`.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(api.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api.base_url.trim_end_matches('/')),
        })
    }

    /// Process-wide transport, built on first use.
    ///
    /// Later calls return the same instance and ignore their argument; the
    /// transport is never rebuilt for the lifetime of the process.
    pub fn shared(api: &ApiConfig) -> Result<&'static HttpTransport, UpstreamError> {
        static SHARED: OnceLock<HttpTransport> = OnceLock::new();
        if let Some(transport) = SHARED.get() {
            return Ok(transport);
        }
        let transport = HttpTransport::new(api)?;
        Ok(SHARED.get_or_init(|| transport))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionTransport for HttpTransport {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, UpstreamError> {
        debug!(endpoint = %self.endpoint, model = request.model, "sending completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(request.api_key)
            .json(&ChatRequest::from_request(request))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text()?;
        parse_completion(&body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

impl<'a> ChatRequest<'a> {
    fn from_request(request: &CompletionRequest<'a>) -> Self {
        Self {
            model: request.model,
            temperature: request.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.prompt.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt.user_instruction,
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's message text. A null or missing `content` is
/// an empty completion, not an error.
fn parse_completion(body: &str) -> Result<String, UpstreamError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| UpstreamError::Malformed(err.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("response contains no choices".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}

/// Read the access credential from `var`. Blank values count as missing.
pub fn credential_from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Single-attempt refinement against a completion transport.
pub struct RefinementClient<T> {
    transport: T,
    credential: Option<SecretString>,
    credential_env: String,
}

impl<T: CompletionTransport> RefinementClient<T> {
    /// `credential_env` names where the credential is expected; it only
    /// appears in the [`DealError::MissingCredential`] message.
    pub fn new(
        transport: T,
        credential: Option<SecretString>,
        credential_env: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credential,
            credential_env: credential_env.into(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Fail with [`DealError::MissingCredential`] unless a credential is set.
    pub fn ensure_credential(&self) -> Result<&SecretString, DealError> {
        self.credential
            .as_ref()
            .ok_or_else(|| DealError::MissingCredential {
                env_var: self.credential_env.clone(),
            })
    }

    /// Send `prompt` once and return the trimmed completion.
    ///
    /// The credential is checked before the transport is touched. Transport
    /// failures are surfaced as [`DealError::Upstream`]; there is no retry.
    #[instrument(skip_all, fields(model = model, temperature = temperature))]
    pub fn refine(
        &self,
        prompt: &PromptPayload,
        model: &str,
        temperature: f32,
    ) -> Result<String, DealError> {
        let credential = self.ensure_credential()?;
        let started = Instant::now();
        let request = CompletionRequest {
            api_key: credential.expose_secret(),
            model,
            temperature,
            prompt,
        };
        let text = self.transport.complete(&request).map_err(|err| {
            warn!(error = %err, "completion failed");
            err
        })?;
        let text = text.trim().to_string();
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "completion received"
        );
        Ok(text)
    }
}
