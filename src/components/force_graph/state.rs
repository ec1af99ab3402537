use std::collections::HashSet;

use super::layout::{DRAG_ALPHA_TARGET, LayoutSettings, NODE_RADIUS, Simulation};
use super::types::{Adjacency, GraphData};

pub const HIT_RADIUS: f64 = 12.0;
/// Opacity of nodes and links outside the hovered neighbourhood.
pub const DIMMED_OPACITY: f64 = 0.2;
/// Link opacity while nothing is hovered.
pub const LINK_OPACITY: f64 = 0.6;
/// Pointer travel (px) below which a press/release counts as a click.
const CLICK_TOLERANCE: f64 = 3.0;

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<String>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	delay_t: f64,
}

/// What a released pointer amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerRelease {
	NodeClick(String),
	BackgroundClick,
	Moved,
}

pub struct ForceGraphState {
	pub simulation: Simulation,
	pub adjacency: Adjacency,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, settings: LayoutSettings, width: f64, height: f64) -> Self {
		Self {
			simulation: Simulation::new(data, settings, width, height),
			adjacency: Adjacency::from_links(&data.links),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
		}
	}

	/// Swaps in a freshly built layout for a new snapshot or settings. Pan and
	/// zoom survive; hover and drag refer to the old nodes and are dropped.
	pub fn rebuild(&mut self, data: &GraphData, settings: LayoutSettings) {
		self.simulation = Simulation::new(data, settings, self.width, self.height);
		self.adjacency = Adjacency::from_links(&data.links);
		self.drag = DragState::default();
		self.hover = HoverState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// HIT_RADIUS is in world-space, scales with zoom like nodes
		self.simulation
			.node_at(gx as f32, gy as f32, HIT_RADIUS as f32)
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.neighbors.clear();
		if let Some(id) = &node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover
				.neighbors
				.extend(self.adjacency.neighbors(id).map(str::to_owned));
		}
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_node.as_deref() == Some(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	fn focus(&self) -> Option<&str> {
		self.hover.node.as_deref().or(self.hover.prev_node.as_deref())
	}

	/// Opacity a node settles at once the highlight transition finishes.
	fn settled_node_opacity(&self, id: &str) -> f64 {
		match self.focus() {
			Some(focus) if !self.adjacency.is_connected(focus, id) => DIMMED_OPACITY,
			_ => 1.0,
		}
	}

	/// Opacity a link settles at once the highlight transition finishes.
	fn settled_link_opacity(&self, source: &str, target: &str) -> f64 {
		match self.focus() {
			None => LINK_OPACITY,
			Some(focus)
				if self.adjacency.is_connected(focus, source)
					&& self.adjacency.is_connected(focus, target) =>
			{
				1.0
			}
			Some(_) => DIMMED_OPACITY,
		}
	}

	/// Starts a press: on a node it pins the node and reheats the layout,
	/// elsewhere it starts panning.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		match self.node_at_position(sx, sy) {
			Some(id) => {
				let (nx, ny) = self.simulation.position(&id).unwrap_or_default();
				self.drag = DragState {
					active: true,
					node: Some(id.clone()),
					moved: false,
					start_x: sx,
					start_y: sy,
					node_start_x: nx,
					node_start_y: ny,
				};
				self.simulation.reheat(DRAG_ALPHA_TARGET);
				self.simulation.pin(&id, nx, ny);
			}
			None => {
				self.pan = PanState {
					active: true,
					moved: false,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		// Update hover state when not dragging
		if !self.drag.active {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}

		if self.drag.active {
			if (sx - self.drag.start_x).hypot(sy - self.drag.start_y) > CLICK_TOLERANCE {
				self.drag.moved = true;
			}
			if let Some(id) = self.drag.node.clone() {
				let (dx, dy) = (
					(sx - self.drag.start_x) / self.transform.k,
					(sy - self.drag.start_y) / self.transform.k,
				);
				self.simulation.pin(
					&id,
					self.drag.node_start_x + dx as f32,
					self.drag.node_start_y + dy as f32,
				);
			}
		} else if self.pan.active {
			if (sx - self.pan.start_x).hypot(sy - self.pan.start_y) > CLICK_TOLERANCE {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Ends a press, unpinning any dragged node.
	pub fn pointer_up(&mut self) -> PointerRelease {
		let release = if self.drag.active {
			self.simulation.release();
			match self.drag.node.take() {
				Some(id) if !self.drag.moved => PointerRelease::NodeClick(id),
				_ => PointerRelease::Moved,
			}
		} else if self.pan.active && !self.pan.moved {
			PointerRelease::BackgroundClick
		} else {
			PointerRelease::Moved
		};
		self.drag = DragState::default();
		self.pan = PanState::default();
		release
	}

	pub fn pointer_leave(&mut self) {
		if self.drag.active {
			self.simulation.release();
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn tick(&mut self, dt: f32) {
		self.simulation.tick(dt);

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Current (eased) node opacity, interpolating toward the settled value.
	pub fn node_opacity(&self, id: &str) -> f64 {
		let t = ease_out_cubic(self.hover.highlight_t);
		1.0 + (self.settled_node_opacity(id) - 1.0) * t
	}

	/// Current (eased) link opacity.
	pub fn link_opacity(&self, source: &str, target: &str) -> f64 {
		let t = ease_out_cubic(self.hover.highlight_t);
		LINK_OPACITY + (self.settled_link_opacity(source, target) - LINK_OPACITY) * t
	}

	pub fn node_radius(&self, id: &str) -> f64 {
		let t = ease_out_cubic(self.hover.highlight_t);
		if self.is_hovered(id) {
			NODE_RADIUS * (1.0 + 0.35 * t)
		} else if self.has_active_highlight() && !self.is_highlighted(id) {
			NODE_RADIUS * (1.0 - 0.15 * t)
		} else {
			NODE_RADIUS
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
