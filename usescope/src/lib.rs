//! # usescope - On-demand CPU Flame Graphs
//!
//! usescope is the profiling side of a USE-method (Utilization, Saturation,
//! Errors) diagnostics tool. When resource counters point at CPU, it samples
//! call stacks with the platform's own profiler and renders them as a flame
//! graph.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  raw text   ┌──────────────┐  folded    ┌──────────────┐
//! │   Capture    │────────────▶│   Folding    │───────────▶│  Flame Tree  │
//! │ perf/dtrace  │             │  (collapse)  │  stacks    │   (build)    │
//! └──────────────┘             └──────┬───────┘            └──────┬───────┘
//!                                     │                           │
//!                                     ▼                           ▼
//!                              app.folded                 ┌──────────────┐
//!                              (re-renderable)            │ Layout + SVG │──▶ app.svg
//!                                                         └──────────────┘
//! ```
//!
//! Capture is the only stage that does I/O, spawns processes, or can be
//! cancelled. Folding, tree building and rendering are pure, deterministic
//! transformations that hold no global state.
//!
//! ## Module Structure
//!
//! - [`capture`]: backend selection (`perf` on Linux, `dtrace` or `sample` on
//!   macOS) and bounded, cancellable tool invocation
//! - [`folding`]: raw stack dump → aggregated `frame;frame;... count` records
//! - [`flame`]: weighted call tree, proportional layout, palettes, SVG output
//! - [`export`]: JSON run summary
//! - [`cli`]: command-line argument parsing
//! - [`preflight`]: artifact path checks before a capture starts
//! - [`domain`]: newtypes (`Pid`, `Hertz`) and error types
//!
//! ## Typical Usage
//!
//! ```bash
//! # 10 second system-wide profile
//! sudo usescope profile --output cpu.svg
//!
//! # Profile one process, then re-render the saved stacks in another palette
//! sudo usescope profile --pid 1234 --duration 30 --output app.svg
//! usescope render app.folded --output app-cold.svg --color cold
//! ```

pub mod capture;
pub mod cli;
pub mod domain;
pub mod export;
pub mod flame;
pub mod folding;
pub mod preflight;
