//! Weighted call tree built from folded stacks
//!
//! Every record walks the tree from the synthetic root, creating a child per
//! unseen frame name, and adds its count to each node it passes through. So a
//! node's value is the number of samples whose call path has that node's path
//! as a prefix, and the root's value is the total sample count.
//!
//! Children live in a `BTreeMap` keyed by frame name: lookups during build are
//! by name and every traversal visits children in sorted order, which keeps
//! layout and rendering deterministic.

use std::collections::BTreeMap;

use crate::domain::FlameError;
use crate::folding::stacks::{FoldedStacks, FRAME_SEPARATOR};

/// Label drawn on the synthetic root frame.
pub const ROOT_NAME: &str = "all";

/// One frame in the call tree. Children are exclusively owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlameNode {
    name: String,
    value: u64,
    children: BTreeMap<String, FlameNode>,
}

impl FlameNode {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), value: 0, children: BTreeMap::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples passing through this node.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = &FlameNode> {
        self.children.values()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&FlameNode> {
        self.children.get(name)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth of the deepest descendant, counting this node as 0.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0usize)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(node.children().map(|c| (c, depth + 1)));
        }
        deepest
    }

    fn add_path(&mut self, frames: &[&str], count: u64) {
        self.value = self.value.saturating_add(count);
        let mut node = self;
        for &frame in frames {
            node = node.children.entry(frame.to_string()).or_insert_with(|| FlameNode::new(frame));
            node.value = node.value.saturating_add(count);
        }
    }
}

// Deep single-path trees would otherwise overflow the stack when dropped
impl Drop for FlameNode {
    fn drop(&mut self) {
        let mut pending: Vec<FlameNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

/// A call tree with at least one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlameTree {
    root: FlameNode,
}

impl FlameTree {
    /// Build from aggregated folded stacks.
    ///
    /// A record with an empty key only adds to the root.
    ///
    /// # Errors
    /// Returns [`FlameError::EmptyTree`] if the total sample count is zero.
    pub fn from_stacks(stacks: &FoldedStacks) -> Result<Self, FlameError> {
        let mut root = FlameNode::new(ROOT_NAME);
        for (key, count) in stacks.iter() {
            let frames: Vec<&str> =
                if key.is_empty() { Vec::new() } else { key.split(FRAME_SEPARATOR).collect() };
            root.add_path(&frames, count);
        }

        if root.value == 0 {
            return Err(FlameError::EmptyTree);
        }
        Ok(Self { root })
    }

    /// Build from folded-stack text.
    ///
    /// # Errors
    /// Returns [`FlameError::EmptyTree`] if no line carries a positive count.
    pub fn from_folded(text: &str) -> Result<Self, FlameError> {
        Self::from_stacks(&FoldedStacks::parse(text))
    }

    #[must_use]
    pub fn root(&self) -> &FlameNode {
        &self.root
    }

    #[must_use]
    pub fn total_samples(&self) -> u64 {
        self.root.value
    }

    /// Depth of the deepest frame; the root is depth 0.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.root.max_depth()
    }
}
