//! Artifact export
//!
//! Writes a machine-readable JSON record of a profiling run alongside the
//! folded stacks and SVG artifacts, and commits the artifact set atomically.

pub mod artifacts;
pub mod summary;

pub use artifacts::ArtifactSet;
pub use summary::RunSummary;
