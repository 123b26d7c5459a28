//! Deixis Common Utilities
//!
//! Shared infrastructure for all Deixis crates:
//! - Error types and result aliases
//! - Run clock and progress throttling
//! - Tracing/logging initialization
//! - Configuration loading and validation

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
