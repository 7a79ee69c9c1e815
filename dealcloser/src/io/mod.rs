//! I/O helpers: configuration, input documents, the generation service and
//! output persistence.

pub mod config;
pub mod data;
pub mod refine;
pub mod sink;
