//! Force and radial layout on top of `force_graph`.
//!
//! `force_graph` supplies many-body charge and spring attraction. Each tick
//! then relaxes links toward [`LINK_DISTANCE`], pulls nodes weakly toward the
//! origin and, in radial mode, toward their ring radius. Alpha cools the
//! whole system so it comes to rest; dragging reheats it.

use std::collections::HashMap;
use std::f32::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::scale::{OrdinalScale, color_key};
use super::types::GraphData;

pub const NODE_RADIUS: f64 = 10.0;
pub const LINK_DISTANCE: f32 = 100.0;
/// Group whose members sit at the origin in aggregated radial layouts.
pub const CENTER_GROUP: &str = "center";
/// Alpha target held while a node is dragged.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

const ALPHA_MIN: f32 = 0.001;
// 1 - ALPHA_MIN^(1/300): cools from 1 to ALPHA_MIN in ~300 ticks.
const ALPHA_DECAY: f32 = 0.0228;
const CENTER_STRENGTH: f32 = 0.02;
const RADIAL_STRENGTH: f32 = 0.7;
const SEED_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
	#[default]
	Force,
	Radial,
}

/// Everything besides the snapshot that shapes a layout. A change rebuilds
/// the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayoutSettings {
	pub mode: LayoutMode,
	pub aggregated: bool,
}

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub color: String,
	radial_target: Option<f32>,
}

/// Borrowed view of one simulated node.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
	pub id: &'a str,
	pub label: &'a str,
	pub color: &'a str,
	pub x: f32,
	pub y: f32,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
	source: DefaultNodeIdx,
	target: DefaultNodeIdx,
	strength: f32,
	bias: f32,
}

#[derive(Clone, Debug)]
struct Pin {
	id: String,
	idx: DefaultNodeIdx,
	x: f32,
	y: f32,
}

pub struct Simulation {
	graph: ForceGraph<NodeInfo, ()>,
	index: HashMap<String, DefaultNodeIdx>,
	order: Vec<String>,
	springs: Vec<Spring>,
	alpha: f32,
	alpha_target: f32,
	pinned: Option<Pin>,
}

fn parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

impl Simulation {
	/// Builds a fresh simulation. Nodes are seeded on a phyllotaxis spiral
	/// around the origin, so equal inputs give equal starting layouts.
	pub fn new(data: &GraphData, settings: LayoutSettings, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(parameters());
		let mut index = HashMap::with_capacity(data.nodes.len());
		let mut order = Vec::with_capacity(data.nodes.len());
		let mut scale = OrdinalScale::new();
		let ring_radius = (width.min(height) / 3.0) as f32;

		for (i, node) in data.nodes.iter().enumerate() {
			let radius = SEED_RADIUS * (0.5 + i as f32).sqrt();
			let angle = i as f32 * PI * (3.0 - 5f32.sqrt());
			let radial_target = match settings.mode {
				LayoutMode::Force => None,
				LayoutMode::Radial
					if settings.aggregated && node.group.as_deref() == Some(CENTER_GROUP) =>
				{
					Some(0.0)
				}
				LayoutMode::Radial => Some(ring_radius),
			};

			let idx = graph.add_node(NodeData {
				x: radius * angle.cos(),
				y: radius * angle.sin(),
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					color: scale.color(color_key(node, settings.aggregated)).to_owned(),
					radial_target,
				},
			});
			index.insert(node.id.clone(), idx);
			order.push(node.id.clone());
		}

		let mut degree: HashMap<DefaultNodeIdx, usize> = HashMap::new();
		let mut pairs = Vec::with_capacity(data.links.len());
		for link in &data.links {
			match (index.get(&link.source), index.get(&link.target)) {
				(Some(&src), Some(&tgt)) => {
					graph.add_edge(src, tgt, EdgeData::default());
					*degree.entry(src).or_default() += 1;
					*degree.entry(tgt).or_default() += 1;
					pairs.push((src, tgt));
				}
				_ => debug!(
					"skipping link {} -> {} with an unknown endpoint",
					link.source, link.target
				),
			}
		}

		let springs = pairs
			.into_iter()
			.map(|(source, target)| {
				let (ds, dt) = (degree[&source] as f32, degree[&target] as f32);
				Spring {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		debug!(
			"built {:?} layout (aggregated: {}) with {} nodes",
			settings.mode,
			settings.aggregated,
			order.len()
		);

		Self {
			graph,
			index,
			order,
			springs,
			alpha: 1.0,
			alpha_target: 0.0,
			pinned: None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	#[cfg(test)]
	pub(crate) fn alpha(&self) -> f32 {
		self.alpha
	}

	pub fn is_running(&self) -> bool {
		!self.is_empty() && (self.alpha >= ALPHA_MIN || self.alpha_target > 0.0)
	}

	/// Node ids in snapshot order.
	pub fn node_ids(&self) -> impl Iterator<Item = &str> {
		self.order.iter().map(String::as_str)
	}

	/// Links that made it into the simulation, as `(source, target)` ids.
	#[cfg(test)]
	pub(crate) fn link_ids(&self) -> Vec<(String, String)> {
		let mut links = Vec::with_capacity(self.springs.len());
		self.graph.visit_edges(|n1, n2, _| {
			links.push((n1.data.user_data.id.clone(), n2.data.user_data.id.clone()));
		});
		links
	}

	pub fn position(&self, id: &str) -> Option<(f32, f32)> {
		let idx = *self.index.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x(), node.y()));
			}
		});
		found
	}

	/// Closest node within `radius` of a graph-space point.
	pub fn node_at(&self, x: f32, y: f32, radius: f32) -> Option<String> {
		let mut best: Option<(f32, String)> = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() - x, node.y() - y);
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < radius && best.as_ref().is_none_or(|(d, _)| dist < *d) {
				best = Some((dist, node.data.user_data.id.clone()));
			}
		});
		best.map(|(_, id)| id)
	}

	pub fn visit_nodes(&self, mut f: impl FnMut(NodeView<'_>)) {
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			f(NodeView {
				id: &info.id,
				label: &info.label,
				color: &info.color,
				x: node.x(),
				y: node.y(),
			});
		});
	}

	pub fn visit_links(&self, mut f: impl FnMut(NodeView<'_>, NodeView<'_>)) {
		self.graph.visit_edges(|n1, n2, _| {
			let (a, b) = (&n1.data.user_data, &n2.data.user_data);
			f(
				NodeView {
					id: &a.id,
					label: &a.label,
					color: &a.color,
					x: n1.x(),
					y: n1.y(),
				},
				NodeView {
					id: &b.id,
					label: &b.label,
					color: &b.color,
					x: n2.x(),
					y: n2.y(),
				},
			);
		});
	}

	/// Pins a node at a graph-space position until [`Simulation::release`].
	pub fn pin(&mut self, id: &str, x: f32, y: f32) {
		let Some(&idx) = self.index.get(id) else {
			return;
		};
		if self.pinned.as_ref().is_some_and(|pin| pin.idx != idx) {
			self.unpin();
		}
		self.pinned = Some(Pin {
			id: id.to_owned(),
			idx,
			x,
			y,
		});
		self.hold_pin(true);
	}

	/// Returns the pinned node to free simulation and lets the layout cool.
	pub fn release(&mut self) {
		self.unpin();
		self.alpha_target = 0.0;
	}

	pub fn pinned_id(&self) -> Option<&str> {
		self.pinned.as_ref().map(|pin| pin.id.as_str())
	}

	fn unpin(&mut self) {
		if let Some(pin) = self.pinned.take() {
			self.graph.visit_nodes_mut(|node| {
				if node.index() == pin.idx {
					node.data.is_anchor = false;
				}
			});
		}
	}

	/// Sets the alpha target; a cooled simulation starts stepping again.
	pub fn reheat(&mut self, target: f32) {
		self.alpha_target = target;
	}

	/// Advances one step. Returns `false` once the layout has come to rest.
	pub fn tick(&mut self, dt: f32) -> bool {
		if !self.is_running() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
		self.graph.update(dt * self.alpha);
		self.apply_layout_forces();
		self.hold_pin(false);
		true
	}

	fn apply_layout_forces(&mut self) {
		let alpha = self.alpha;
		let mut positions = HashMap::with_capacity(self.order.len());
		self.graph.visit_nodes(|node| {
			positions.insert(node.index(), (node.x(), node.y()));
		});

		let mut shift: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();
		for spring in &self.springs {
			let (Some(&(sx, sy)), Some(&(tx, ty))) =
				(positions.get(&spring.source), positions.get(&spring.target))
			else {
				continue;
			};
			let (dx, dy) = (tx - sx, ty - sy);
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < f32::EPSILON {
				continue;
			}
			let l = (dist - LINK_DISTANCE) / dist * alpha * spring.strength;
			let (mx, my) = (dx * l, dy * l);

			let target = shift.entry(spring.target).or_default();
			target.0 -= mx * spring.bias;
			target.1 -= my * spring.bias;
			let source = shift.entry(spring.source).or_default();
			source.0 += mx * (1.0 - spring.bias);
			source.1 += my * (1.0 - spring.bias);
		}

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			let (sx, sy) = shift.get(&node.index()).copied().unwrap_or_default();
			let (mut x, mut y) = (node.data.x + sx, node.data.y + sy);
			x -= x * CENTER_STRENGTH * alpha;
			y -= y * CENTER_STRENGTH * alpha;

			if let Some(target) = node.data.user_data.radial_target {
				let dist = (x * x + y * y).sqrt();
				if dist > f32::EPSILON {
					let k = (target - dist) * RADIAL_STRENGTH * alpha / dist;
					x += x * k;
					y += y * k;
				}
			}
			node.data.x = x;
			node.data.y = y;
		});
	}

	fn hold_pin(&mut self, anchor: bool) {
		let Some(pin) = self.pinned.as_ref() else {
			return;
		};
		let (idx, x, y) = (pin.idx, pin.x, pin.y);
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = x;
				node.data.y = y;
				if anchor {
					node.data.is_anchor = true;
				}
			}
		});
	}
}
