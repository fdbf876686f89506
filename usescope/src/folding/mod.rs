//! Stack folding
//!
//! Turns a profiler's raw stack dump into aggregated folded stacks, the stable
//! intermediate artifact that can be re-rendered without re-sampling.

pub mod collapse;
pub mod stacks;

pub use collapse::{collapse, CollapseOptions, StackFormat};
pub use stacks::FoldedStacks;
