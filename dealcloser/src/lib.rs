//! Channel-aware sales outreach message generator.
//!
//! A request flows through one pipeline: channel-rule resolution, context
//! normalization, then either template rendering or model-based refinement,
//! and finally the output sink. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (rules, normalization, templates,
//!   instruction composition). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config and data files, the
//!   generation service, output files). Isolated behind small seams so tests
//!   can script them.
//!
//! [`pipeline`] coordinates core logic with I/O for the CLI.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
