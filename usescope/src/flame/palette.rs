//! Flame graph color schemes
//!
//! Color is a pure function of (depth, scheme): no randomness, so the same tree
//! always renders to the same bytes. Channels cycle with depth so adjacent rows
//! stay distinguishable.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Canvas background
pub const BACKGROUND: Rgb = Rgb(255, 255, 255);
/// Subtitle and secondary text
pub const MUTED_TEXT: Rgb = Rgb(102, 102, 102);

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Reds and oranges (CPU)
    #[default]
    Hot,
    /// Blues and teals
    Cold,
    /// Greens (memory)
    Mem,
}

impl ColorScheme {
    /// Fill color for a frame at `depth` (root is 0).
    #[must_use]
    pub fn color(self, depth: usize) -> Rgb {
        match self {
            ColorScheme::Hot => Rgb(cycle(200, 15, 55, depth), cycle(50, 40, 150, depth), 30),
            ColorScheme::Cold => Rgb(30, cycle(50, 30, 150, depth), cycle(150, 20, 100, depth)),
            ColorScheme::Mem => Rgb(30, cycle(190, 15, 60, depth), 30),
        }
    }
}

/// `base + (depth * step) % modulus`, saturating at 255.
fn cycle(base: u8, step: usize, modulus: usize, depth: usize) -> u8 {
    let offset = (depth % modulus).wrapping_mul(step) % modulus;
    u8::try_from(offset).map_or(u8::MAX, |o| base.saturating_add(o))
}
