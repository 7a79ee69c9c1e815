//! Stable exit codes for dealcloser CLI commands.

use crate::error::DealError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed for a reason outside the pipeline taxonomy (config, data
/// documents, templates, output files).
pub const FAILURE: i32 = 1;
/// Required input was missing or out of range.
pub const INVALID_INPUT: i32 = 2;
/// Refinement was requested without an access credential.
pub const MISSING_CREDENTIAL: i32 = 3;
/// The generation service failed.
pub const UPSTREAM: i32 = 4;
/// The requested channel has no template.
pub const UNSUPPORTED_CHANNEL: i32 = 5;

/// Exit code for an error, looking through any added context.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DealError>() {
        Some(DealError::InvalidInput { .. }) => INVALID_INPUT,
        Some(DealError::MissingCredential { .. }) => MISSING_CREDENTIAL,
        Some(DealError::Upstream(_)) => UPSTREAM,
        Some(DealError::UnsupportedChannel { .. }) => UNSUPPORTED_CHANNEL,
        Some(DealError::Template(_) | DealError::Output { .. }) | None => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn codes_survive_added_context() {
        let err: anyhow::Result<()> = Err(DealError::MissingCredential {
            env_var: "OPENAI_API_KEY".to_string(),
        })
        .context("generate email");
        assert_eq!(for_error(&err.unwrap_err()), MISSING_CREDENTIAL);
    }

    #[test]
    fn foreign_errors_are_generic_failures() {
        assert_eq!(for_error(&anyhow::anyhow!("parse config")), FAILURE);
    }
}
