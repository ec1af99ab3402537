//! Ordinal color scale for node fills.

use std::collections::HashMap;

use super::types::GraphNode;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Category used when a node has no type (or no group when aggregated).
pub const DEFAULT_CATEGORY: &str = "default";

/// Categorical key a node is colored by.
pub fn color_key(node: &GraphNode, aggregated: bool) -> &str {
	let key = if aggregated { &node.group } else { &node.kind };
	key.as_deref().unwrap_or(DEFAULT_CATEGORY)
}

/// Assigns palette entries in order of first appearance; a key keeps its
/// color for the life of the scale.
#[derive(Clone, Debug, Default)]
pub struct OrdinalScale {
	assigned: HashMap<String, usize>,
}

impl OrdinalScale {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn color(&mut self, key: &str) -> &'static str {
		let next = self.assigned.len();
		let slot = *self.assigned.entry(key.to_owned()).or_insert(next);
		COLORS[slot % COLORS.len()]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_key_same_color() {
		let mut scale = OrdinalScale::new();
		let first = scale.color("Actor");
		scale.color("Component");
		assert_eq!(scale.color("Actor"), first);
	}

	#[test]
	fn first_ten_keys_get_distinct_colors() {
		let mut scale = OrdinalScale::new();
		let colors: Vec<_> = (0..10).map(|i| scale.color(&format!("k{i}"))).collect();
		for (i, a) in colors.iter().enumerate() {
			for b in &colors[i + 1..] {
				assert_ne!(a, b);
			}
		}
		assert_eq!(scale.color("k10"), colors[0]);
	}

	#[test]
	fn key_follows_aggregation() {
		let node = GraphNode::new("1", "Pawn")
			.with_kind("Class")
			.with_group("center");
		assert_eq!(color_key(&node, false), "Class");
		assert_eq!(color_key(&node, true), "center");

		let bare = GraphNode::new("2", "Thing");
		assert_eq!(color_key(&bare, false), DEFAULT_CATEGORY);
		assert_eq!(color_key(&bare, true), DEFAULT_CATEGORY);
	}
}
