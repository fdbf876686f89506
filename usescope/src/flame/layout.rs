//! Proportional flame graph layout
//!
//! The root spans the full chart width; each child gets
//! `floor(parent_width * child.value / parent.value)` pixels, laid out left to
//! right in name order. Children whose share floors to zero are drawn as 1 px
//! hairlines, paid for only out of the parent's flooring slack
//! (`parent_width - Σ floor widths`), so a heavy sibling always keeps its exact
//! proportional width. Hairlines that no longer fit in the slack are not placed.

use log::debug;

use super::tree::{FlameNode, FlameTree};

/// A positioned frame, in chart coordinates (x grows right, depth grows up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect<'a> {
    pub name: &'a str,
    pub value: u64,
    pub depth: usize,
    pub x: u32,
    pub width: u32,
}

/// Lay out every frame of `tree` in pre-order (parent before children).
///
/// `x` is the left edge of the chart and `width` its usable width; a zero
/// width is widened to 1 so the root is always drawn.
#[must_use]
pub fn layout(tree: &FlameTree, x: u32, width: u32) -> Vec<FrameRect<'_>> {
    let mut rects = Vec::new();
    let mut clipped = 0usize;

    // Explicit work stack: tree depth is bounded only by the input
    let mut pending = vec![(tree.root(), 0usize, x, width.max(1))];
    while let Some((node, depth, x, width)) = pending.pop() {
        rects.push(FrameRect { name: node.name(), value: node.value(), depth, x, width });
        let placed = place_children(node, x, width, &mut clipped);
        pending.extend(placed.into_iter().rev().map(|(child, cx, cw)| (child, depth + 1, cx, cw)));
    }

    if clipped > 0 {
        debug!("{clipped} frames had no horizontal space left in their parent");
    }
    rects
}

/// Position `node`'s children inside `[x, x + width)`.
fn place_children<'a>(
    node: &'a FlameNode,
    x: u32,
    width: u32,
    clipped: &mut usize,
) -> Vec<(&'a FlameNode, u32, u32)> {
    if node.value() == 0 {
        return Vec::new();
    }

    let floors: Vec<u32> =
        node.children().map(|c| proportional_width(width, c.value(), node.value())).collect();
    let reserved = floors.iter().fold(0u32, |acc, &w| acc.saturating_add(w));
    let mut slack = width.saturating_sub(reserved);

    let mut placed = Vec::with_capacity(floors.len());
    let mut cursor = x;
    for (child, floor) in node.children().zip(floors) {
        let child_width = if floor > 0 {
            floor
        } else if slack > 0 {
            slack -= 1;
            1
        } else {
            *clipped += 1;
            continue;
        };
        placed.push((child, cursor, child_width));
        cursor = cursor.saturating_add(child_width);
    }
    placed
}

/// `floor(width * part / whole)`, computed without overflow.
fn proportional_width(width: u32, part: u64, whole: u64) -> u32 {
    let scaled = u128::from(width) * u128::from(part) / u128::from(whole);
    u32::try_from(scaled).unwrap_or(width)
}
