//! Domain model for usescope
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Structured error handling per pipeline stage

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Hertz, Pid};

pub use errors::{ExportError, FlameError, ProfilerError};
