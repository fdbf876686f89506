//! SVG flame graph renderer
//!
//! Draws the layout from [`super::layout`] bottom-up: the root row sits just
//! above the bottom margin and each deeper frame is one row higher. Every frame
//! is a `<g>` holding a hover `<title>`, the rectangle and (if it fits) a label.
//!
//! All sizing lives in [`FrameStyle`] inside the [`RenderSpec`] passed in, so
//! concurrent renders with different settings never share state. The output has
//! no timestamps and visits frames in a fixed order, so identical inputs render
//! to identical bytes.

// Percentages are display values; precision loss above 2^52 samples is fine
#![allow(clippy::cast_precision_loss)]

use std::io::Write;

use super::layout::{layout, FrameRect};
use super::palette::{ColorScheme, BACKGROUND, MUTED_TEXT};
use super::tree::FlameTree;
use crate::domain::FlameError;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_TITLE: &str = "Flame Graph";

/// Fixed geometry and typography of the rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStyle {
    /// Row height per depth level
    pub frame_height: u32,
    pub font_size: u32,
    /// Space above the chart for title and subtitle
    pub header_height: u32,
    /// Left and right margin around the chart
    pub side_margin: u32,
    pub bottom_margin: u32,
    /// Frames this wide or narrower get no label
    pub min_label_width: u32,
    /// Approximate monospace glyph width used to fit labels
    pub char_width: u32,
    /// Below this many characters a truncated label is omitted entirely
    pub min_label_chars: usize,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            frame_height: 16,
            font_size: 12,
            header_height: 40,
            side_margin: 10,
            bottom_margin: 20,
            min_label_width: 40,
            char_width: 7,
            min_label_chars: 3,
        }
    }
}

/// What to draw and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    pub width: u32,
    /// Derived from tree depth when unset
    pub height: Option<u32>,
    pub title: String,
    pub color_scheme: ColorScheme,
    pub style: FrameStyle,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: None,
            title: DEFAULT_TITLE.to_string(),
            color_scheme: ColorScheme::default(),
            style: FrameStyle::default(),
        }
    }
}

impl RenderSpec {
    /// `(max_depth + 2) * frame_height + header_height + bottom_margin`
    #[must_use]
    pub fn derived_height(&self, max_depth: usize) -> u32 {
        let rows = u32::try_from(max_depth).unwrap_or(u32::MAX).saturating_add(2);
        rows.saturating_mul(self.style.frame_height)
            .saturating_add(self.style.header_height)
            .saturating_add(self.style.bottom_margin)
    }
}

/// Render `tree` as SVG into `out`.
///
/// # Errors
/// Returns [`FlameError::EmptyTree`] for a tree with no samples, or
/// [`FlameError::Io`] if writing fails.
pub fn render_svg<W: Write>(tree: &FlameTree, spec: &RenderSpec, mut out: W) -> Result<(), FlameError> {
    let total = tree.total_samples();
    if total == 0 {
        return Err(FlameError::EmptyTree);
    }

    let style = &spec.style;
    let width = if spec.width == 0 { DEFAULT_WIDTH } else { spec.width };
    let height = spec
        .height
        .filter(|&h| h > 0)
        .unwrap_or_else(|| spec.derived_height(tree.max_depth()));

    write!(
        out,
        r#"<?xml version="1.0" standalone="no"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg version="1.1" width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">
<style>
  .func:hover {{ stroke:black; stroke-width:0.5; cursor:pointer; }}
  text {{ font-family: monospace; font-size: {font}px; }}
</style>
<rect x="0" y="0" width="{width}" height="{height}" fill="{background}"/>
<text x="{center}" y="20" text-anchor="middle" style="font-size:16px; font-weight:bold;">{title}</text>
<text x="{center}" y="35" text-anchor="middle" style="font-size:12px; fill:{muted};">({total} samples)</text>
"#,
        font = style.font_size,
        background = BACKGROUND,
        center = width / 2,
        title = escape_xml(&spec.title),
        muted = MUTED_TEXT,
    )?;

    let chart_width = width.saturating_sub(style.side_margin.saturating_mul(2));
    let base_y = i64::from(height) - i64::from(style.bottom_margin);
    for rect in layout(tree, style.side_margin, chart_width) {
        write_frame(&mut out, &rect, spec, base_y, total)?;
    }

    writeln!(out, "</svg>")?;
    out.flush()?;
    Ok(())
}

/// Render `tree` to an in-memory SVG document.
///
/// # Errors
/// Returns [`FlameError::EmptyTree`] for a tree with no samples.
pub fn render_to_vec(tree: &FlameTree, spec: &RenderSpec) -> Result<Vec<u8>, FlameError> {
    let mut buf = Vec::new();
    render_svg(tree, spec, &mut buf)?;
    Ok(buf)
}

fn write_frame<W: Write>(
    out: &mut W,
    rect: &FrameRect<'_>,
    spec: &RenderSpec,
    base_y: i64,
    total: u64,
) -> std::io::Result<()> {
    let style = &spec.style;
    let frame_height = i64::from(style.frame_height);
    let depth = i64::try_from(rect.depth).unwrap_or(i64::MAX / 2);
    let row_bottom = base_y - depth * frame_height;
    let percent = rect.value as f64 / total as f64 * 100.0;

    writeln!(out, r#"<g class="func">"#)?;
    writeln!(
        out,
        "<title>{} ({} samples, {percent:.1}%)</title>",
        escape_xml(rect.name),
        rect.value
    )?;
    writeln!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" rx="1"/>"#,
        rect.x,
        row_bottom - frame_height,
        rect.width,
        style.frame_height.saturating_sub(1),
        spec.color_scheme.color(rect.depth),
    )?;
    if let Some(label) = fit_label(rect.name, rect.width, style) {
        writeln!(
            out,
            r#"<text x="{}" y="{}" fill="black">{}</text>"#,
            u64::from(rect.x) + 2,
            row_bottom - 4,
            escape_xml(&label)
        )?;
    }
    writeln!(out, "</g>")
}

/// The label that fits in `width` pixels, truncated with `..` if needed.
fn fit_label(name: &str, width: u32, style: &FrameStyle) -> Option<String> {
    if name.is_empty() || width <= style.min_label_width {
        return None;
    }
    let max_chars = usize::try_from((width - 4) / style.char_width.max(1)).unwrap_or(usize::MAX);
    if name.chars().count() <= max_chars {
        return Some(name.to_string());
    }
    if max_chars <= style.min_label_chars {
        return None;
    }
    let kept: String = name.chars().take(max_chars - 2).collect();
    Some(format!("{kept}.."))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(folded: &str, spec: &RenderSpec) -> String {
        let tree = FlameTree::from_folded(folded).unwrap();
        String::from_utf8(render_to_vec(&tree, spec).unwrap()).unwrap()
    }

    #[test]
    fn test_derived_height() {
        let spec = RenderSpec::default();
        // depth 2 → 4 rows of 16 + 40 header + 20 margin
        assert_eq!(spec.derived_height(2), 124);
    }

    #[test]
    fn test_header_and_frames() {
        let svg = render("a;b 2\na;c 1\n", &RenderSpec::default());

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="1200" height="124""#));
        assert!(svg.contains(">Flame Graph</text>"));
        assert!(svg.contains("(3 samples)"));
        assert!(svg.contains("<title>b (2 samples, 66.7%)</title>"));
        assert!(svg.contains("<title>c (1 samples, 33.3%)</title>"));
        assert_eq!(svg.matches(r#"<g class="func">"#).count(), 4);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_root_drawn_at_bottom_row() {
        let svg = render("a 1\n", &RenderSpec::default());
        // height = 3 rows * 16 + 60 = 108; root row spans y 72..88
        assert!(svg.contains(r#"<rect x="10" y="72" width="1180" height="15" fill="rgb(200,50,30)" rx="1"/>"#));
        assert!(svg.contains(r#"<rect x="10" y="56" width="1180" height="15" fill="rgb(215,90,30)" rx="1"/>"#));
    }

    #[test]
    fn test_explicit_height_and_scheme() {
        let spec = RenderSpec {
            height: Some(300),
            color_scheme: ColorScheme::Mem,
            ..RenderSpec::default()
        };
        let svg = render("a 1\n", &spec);
        assert!(svg.contains(r#"height="300""#));
        assert!(svg.contains("fill=\"rgb(30,190,30)\""));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let text = "main;z 3\nmain;a;b 2\nmain;m 1\nidle 4\n";
        let spec = RenderSpec { title: "cpu".to_string(), ..RenderSpec::default() };
        assert_eq!(render(text, &spec), render(text, &spec));
    }

    #[test]
    fn test_names_escaped() {
        let spec = RenderSpec { title: "a<b> & c".to_string(), ..RenderSpec::default() };
        let svg = render("Vec<T>::push 1\n", &spec);
        assert!(svg.contains("a&lt;b&gt; &amp; c"));
        assert!(svg.contains("<title>Vec&lt;T&gt;::push (1 samples, 100.0%)</title>"));
        assert!(!svg.contains("Vec<T>"));
    }

    #[test]
    fn test_fit_label() {
        let style = FrameStyle::default();
        assert_eq!(fit_label("main", 40, &style), None);
        assert_eq!(fit_label("main", 100, &style).as_deref(), Some("main"));
        // (60 - 4) / 7 = 8 chars available
        assert_eq!(fit_label("process_request", 60, &style).as_deref(), Some("proces.."));
        // (45 - 4) / 7 = 5 chars still truncates
        assert_eq!(fit_label("abcdefgh", 45, &style).as_deref(), Some("abc.."));
        assert_eq!(fit_label("", 500, &style), None);
    }

    #[test]
    fn test_label_omitted_when_too_few_chars() {
        let style = FrameStyle { char_width: 12, ..FrameStyle::default() };
        // (44 - 4) / 12 = 3 chars: not worth truncating
        assert_eq!(fit_label("abcdef", 44, &style), None);
    }
}
