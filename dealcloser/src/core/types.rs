//! Request and result types shared by the pipeline stages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::channel::{ChannelId, ChannelRule};
use crate::core::context::OutreachContext;

/// Generation strategy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fill the channel's static template.
    Template,
    /// Delegate to the external generation service.
    LlmRefine,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Template => "template",
            Mode::LlmRefine => "llm_refine",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How model refinement obtains its instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefineStrategy {
    /// Compose an instruction from the context and channel rules.
    #[default]
    Compose,
    /// Render the template draft and ask the model to rewrite it.
    Rewrite,
}

/// One validated, normalized request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Channel identifier exactly as the caller supplied it.
    pub requested_channel: String,
    pub context: OutreachContext,
    pub channel: &'static ChannelRule,
    pub mode: Mode,
}

/// Final text of one request. Created once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub channel: ChannelId,
    pub generated_at: DateTime<Utc>,
    pub source_mode: Mode,
}
