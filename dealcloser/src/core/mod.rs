//! Deterministic, pure logic of the message-composition pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod channel;
pub mod context;
pub mod prompt;
pub mod render;
pub mod types;
