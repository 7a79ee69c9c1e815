//! Diagnostic tracing for the CLI.
//!
//! Logs go to stderr so generated messages on stdout stay clean for piping.
//! What gets logged, by level:
//!
//! - `debug`: each prepared request (requested and resolved channel, mode,
//!   handle, flags), template overrides, file writes, outgoing completion
//!   requests.
//! - `info`: completion timing and length, written drafts, finished runs.
//! - `warn`: failed completions and drafts longer than their channel's
//!   advisory character limit. Credentials are never logged.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber.
///
/// `RUST_LOG` selects the filter (it may also come from `.env`, which is
/// loaded first); without it only warnings are shown, so a normal run prints
/// nothing besides the message itself.
///
/// ```bash
/// RUST_LOG=dealcloser=debug dealcloser generate --channel telegram --use-llm
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
