//! Flame graph construction and rendering
//!
//! folded text → [`FlameTree`] → [`layout`] → SVG via [`render_svg`].

pub mod layout;
pub mod palette;
pub mod svg;
pub mod tree;

pub use layout::{layout, FrameRect};
pub use palette::{ColorScheme, Rgb};
pub use svg::{render_svg, render_to_vec, FrameStyle, RenderSpec};
pub use tree::{FlameNode, FlameTree};
