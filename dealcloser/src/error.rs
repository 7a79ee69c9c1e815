//! Error types for the message-composition pipeline.

use std::path::PathBuf;

/// Failures surfaced by the pipeline. Normalization never fails; everything
/// else reports one of these kinds.
#[derive(Debug, thiserror::Error)]
pub enum DealError {
    #[error("no API credential configured: set {env_var} in the environment or a .env file")]
    MissingCredential { env_var: String },

    #[error("unsupported channel '{channel}' (templates exist for: {supported})")]
    UnsupportedChannel { channel: String, supported: String },

    #[error("generation service failed")]
    Upstream(#[from] UpstreamError),

    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("template rendering failed")]
    Template(#[from] minijinja::Error),

    #[error("failed to write {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the external generation service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}
