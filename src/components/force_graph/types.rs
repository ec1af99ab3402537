use std::collections::{BTreeMap, HashMap, HashSet};

/// A primitive property carried over from the graph database's property bag.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
	Text(String),
	Number(f64),
	Bool(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub kind: Option<String>,
	pub description: Option<String>,
	pub group: Option<String>,
	pub extra: BTreeMap<String, AttributeValue>,
}

impl GraphNode {
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			kind: None,
			description: None,
			group: None,
			extra: BTreeMap::new(),
		}
	}

	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());
		self
	}

	pub fn with_group(mut self, group: impl Into<String>) -> Self {
		self.group = Some(group.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	pub label: String,
	pub extra: BTreeMap<String, AttributeValue>,
}

impl GraphLink {
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		label: impl Into<String>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			label: label.into(),
			extra: BTreeMap::new(),
		}
	}
}

/// One complete snapshot of the visible graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphData {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Undirected neighbour sets built from every link of a snapshot.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
	neighbors: HashMap<String, HashSet<String>>,
}

impl Adjacency {
	pub fn from_links(links: &[GraphLink]) -> Self {
		let mut neighbors: HashMap<String, HashSet<String>> = HashMap::new();
		for link in links {
			neighbors
				.entry(link.source.clone())
				.or_default()
				.insert(link.target.clone());
			neighbors
				.entry(link.target.clone())
				.or_default()
				.insert(link.source.clone());
		}
		Self { neighbors }
	}

	/// A node is always connected to itself.
	pub fn is_connected(&self, a: &str, b: &str) -> bool {
		a == b || self.neighbors.get(a).is_some_and(|set| set.contains(b))
	}

	pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &str> {
		self.neighbors
			.get(id)
			.into_iter()
			.flat_map(|set| set.iter().map(String::as_str))
	}
}
