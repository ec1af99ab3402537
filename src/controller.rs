//! Interaction controller: selection, context menu, and the requests that
//! replace the displayed snapshot.
//!
//! The state lives in one [`ExplorerState`] value. UI code keeps it in a
//! signal; anything implementing [`StateHandle`] can drive the async
//! operations, which is how the tests run them without a browser.

use std::sync::Arc;

use log::{error, info};

use crate::api::{GraphService, TraceDirection};
use crate::components::force_graph::{GraphData, GraphNode, LayoutMode, LayoutSettings};
use crate::handle::StateHandle;

/// An atomically replaced graph snapshot. Two snapshots are equal only when
/// they come from the same replacement.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
	revision: u64,
	data: Arc<GraphData>,
}

impl Snapshot {
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn data(&self) -> &GraphData {
		&self.data
	}

	fn replaced_by(&self, data: GraphData) -> Self {
		Self {
			revision: self.revision + 1,
			data: Arc::new(data),
		}
	}
}

impl PartialEq for Snapshot {
	fn eq(&self, other: &Self) -> bool {
		self.revision == other.revision && Arc::ptr_eq(&self.data, &other.data)
	}
}

/// Action menu opened on a node, at page coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
	pub node: GraphNode,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ExplorerState {
	snapshot: Snapshot,
	pub selected: Option<GraphNode>,
	pub context_menu: Option<ContextMenu>,
	pub loading: bool,
	pub error: Option<String>,
	pub layout: LayoutSettings,
}

impl ExplorerState {
	pub fn snapshot(&self) -> &Snapshot {
		&self.snapshot
	}

	pub fn graph(&self) -> &GraphData {
		self.snapshot.data()
	}

	/// Swaps in a whole new snapshot. Nothing of the previous one is kept; a
	/// selection survives only if its node is part of the new snapshot.
	pub fn replace_graph(&mut self, data: GraphData) {
		self.selected = self
			.selected
			.take()
			.and_then(|node| data.node(&node.id).cloned());
		self.context_menu = None;
		self.snapshot = self.snapshot.replaced_by(data);
	}

	/// Selection comes from a canvas click, which also dismisses the menu.
	pub fn select(&mut self, node: Option<GraphNode>) {
		self.selected = node;
		self.close_context_menu();
	}

	/// Opens a menu for `node`, replacing any menu already open.
	pub fn open_context_menu(&mut self, node: GraphNode, x: f64, y: f64) {
		self.context_menu = Some(ContextMenu { node, x, y });
	}

	pub fn close_context_menu(&mut self) {
		self.context_menu = None;
	}

	/// A click on empty canvas.
	pub fn background_click(&mut self) {
		self.close_context_menu();
	}

	pub fn set_layout_mode(&mut self, mode: LayoutMode) {
		self.layout.mode = mode;
	}

	pub fn toggle_aggregation(&mut self) {
		self.layout.aggregated = !self.layout.aggregated;
	}
}

/// Raises the loading flag and clears it again when dropped, whether the
/// request finished, failed, or its future was abandoned.
struct LoadingGuard<H: StateHandle<ExplorerState>> {
	handle: H,
}

impl<H: StateHandle<ExplorerState>> LoadingGuard<H> {
	fn begin(handle: &H) -> Self {
		handle.apply(|s| {
			s.loading = true;
			s.error = None;
		});
		Self {
			handle: handle.clone(),
		}
	}
}

impl<H: StateHandle<ExplorerState>> Drop for LoadingGuard<H> {
	fn drop(&mut self) {
		self.handle.apply(|s| s.loading = false);
	}
}

/// Fetches the initial snapshot and replaces the current one.
pub async fn reload<H, S>(handle: &H, service: &S)
where
	H: StateHandle<ExplorerState>,
	S: GraphService + ?Sized,
{
	let _loading = LoadingGuard::begin(handle);
	match service.fetch_graph().await {
		Ok(data) => {
			info!(
				"loaded graph with {} nodes and {} links",
				data.nodes.len(),
				data.links.len()
			);
			handle.apply(|s| s.replace_graph(data));
		}
		Err(err) => {
			error!("Failed to fetch initial graph data: {err}");
			handle.apply(|s| s.error = Some(err.to_string()));
		}
	}
}

/// Traces dependencies of `node_id` and replaces the snapshot with the
/// result. On failure the current snapshot stays on screen.
pub async fn trace<H, S>(handle: &H, service: &S, node_id: &str, direction: TraceDirection)
where
	H: StateHandle<ExplorerState>,
	S: GraphService + ?Sized,
{
	handle.apply(|s| s.close_context_menu());
	let _loading = LoadingGuard::begin(handle);
	match service.trace(node_id, direction).await {
		Ok(data) => {
			info!(
				"trace {direction:?} from {node_id} returned {} nodes",
				data.nodes.len()
			);
			handle.apply(|s| s.replace_graph(data));
		}
		Err(err) => {
			error!("Failed to trace graph: {err}");
			handle.apply(|s| s.error = Some(format!("Failed to trace graph: {err}")));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::{Cell, RefCell};
	use std::rc::Rc;

	use async_trait::async_trait;
	use futures::FutureExt;
	use futures::executor::block_on;

	use super::*;
	use crate::components::force_graph::GraphLink;
	use crate::error::{AppError, Result};

	fn graph(ids: &[&str]) -> GraphData {
		GraphData {
			nodes: ids.iter().map(|id| GraphNode::new(*id, *id)).collect(),
			links: ids
				.windows(2)
				.map(|w| GraphLink::new(w[0], w[1], "DEPENDS_ON"))
				.collect(),
		}
	}

	enum Reply {
		Graph(GraphData),
		Fail(AppError),
		Hang,
	}

	struct FakeGraph {
		reply: Reply,
		state: Rc<RefCell<ExplorerState>>,
		loading_seen: Cell<Option<bool>>,
		traced: RefCell<Vec<(String, TraceDirection)>>,
	}

	impl FakeGraph {
		fn new(state: &Rc<RefCell<ExplorerState>>, reply: Reply) -> Self {
			Self {
				reply,
				state: state.clone(),
				loading_seen: Cell::new(None),
				traced: RefCell::new(Vec::new()),
			}
		}

		async fn answer(&self) -> Result<GraphData> {
			self.loading_seen.set(Some(self.state.borrow().loading));
			match &self.reply {
				Reply::Graph(data) => Ok(data.clone()),
				Reply::Fail(err) => Err(err.clone()),
				Reply::Hang => futures::future::pending::<Result<GraphData>>().await,
			}
		}
	}

	#[async_trait(?Send)]
	impl GraphService for FakeGraph {
		async fn fetch_graph(&self) -> Result<GraphData> {
			self.answer().await
		}

		async fn trace(&self, node_id: &str, direction: TraceDirection) -> Result<GraphData> {
			self.traced
				.borrow_mut()
				.push((node_id.to_owned(), direction));
			self.answer().await
		}
	}

	fn state_with(data: GraphData) -> Rc<RefCell<ExplorerState>> {
		let mut state = ExplorerState::default();
		state.replace_graph(data);
		Rc::new(RefCell::new(state))
	}

	#[test]
	fn successful_trace_replaces_the_snapshot() {
		let state = state_with(graph(&["1", "2", "3"]));
		let s2 = graph(&["3", "9"]);
		let service = FakeGraph::new(&state, Reply::Graph(s2.clone()));
		let before = state.borrow().snapshot().revision();

		block_on(trace(&state, &service, "3", TraceDirection::Upstream));

		let state = state.borrow();
		assert_eq!(state.graph(), &s2);
		assert!(state.graph().node("1").is_none());
		assert!(state.graph().node("2").is_none());
		assert_eq!(state.snapshot().revision(), before + 1);
		assert!(!state.loading);
		assert_eq!(state.error, None);
		assert_eq!(service.loading_seen.get(), Some(true));
		assert_eq!(
			*service.traced.borrow(),
			vec![("3".to_owned(), TraceDirection::Upstream)]
		);
	}

	#[test]
	fn failed_trace_keeps_the_snapshot() {
		let s1 = graph(&["1", "2"]);
		let state = state_with(s1.clone());
		let service = FakeGraph::new(
			&state,
			Reply::Fail(AppError::Status {
				status: 500,
				message: "neo4j unavailable".into(),
			}),
		);
		let before = state.borrow().snapshot().clone();

		block_on(trace(&state, &service, "2", TraceDirection::Downstream));

		let state = state.borrow();
		assert_eq!(state.graph(), &s1);
		assert_eq!(state.snapshot(), &before);
		assert!(!state.loading);
		assert_eq!(
			state.error.as_deref(),
			Some("Failed to trace graph: server responded with 500: neo4j unavailable")
		);
	}

	#[test]
	fn abandoned_request_still_clears_loading() {
		let state = state_with(graph(&["1"]));
		let service = FakeGraph::new(&state, Reply::Hang);

		let finished = trace(&state, &service, "1", TraceDirection::Upstream).now_or_never();

		assert!(finished.is_none());
		assert_eq!(service.loading_seen.get(), Some(true));
		assert!(!state.borrow().loading);
		assert_eq!(state.borrow().graph(), &graph(&["1"]));
	}

	#[test]
	fn trace_closes_the_context_menu() {
		let state = state_with(graph(&["1", "2"]));
		state
			.borrow_mut()
			.open_context_menu(GraphNode::new("1", "1"), 10.0, 20.0);
		let service = FakeGraph::new(&state, Reply::Fail(AppError::Transport("offline".into())));

		block_on(trace(&state, &service, "1", TraceDirection::Upstream));
		assert_eq!(state.borrow().context_menu, None);
	}

	#[test]
	fn reload_surfaces_errors_and_recovers() {
		let state = Rc::new(RefCell::new(ExplorerState::default()));
		let failing = FakeGraph::new(
			&state,
			Reply::Fail(AppError::malformed("graph", "missing field `links`")),
		);
		block_on(reload(&state, &failing));
		assert!(state.borrow().graph().is_empty());
		assert!(state.borrow().error.is_some());

		let working = FakeGraph::new(&state, Reply::Graph(graph(&["a", "b"])));
		block_on(reload(&state, &working));
		assert_eq!(state.borrow().graph().nodes.len(), 2);
		assert_eq!(state.borrow().error, None);
		assert!(!state.borrow().loading);
	}

	#[test]
	fn only_one_context_menu_at_a_time() {
		let mut state = ExplorerState::default();
		state.open_context_menu(GraphNode::new("a", "A"), 1.0, 2.0);
		state.open_context_menu(GraphNode::new("b", "B"), 3.0, 4.0);
		assert_eq!(
			state.context_menu.as_ref().map(|m| m.node.id.as_str()),
			Some("b")
		);
		state.background_click();
		assert_eq!(state.context_menu, None);
	}

	#[test]
	fn node_click_closes_the_context_menu() {
		let mut state = ExplorerState::default();
		state.open_context_menu(GraphNode::new("a", "A"), 1.0, 2.0);
		state.select(Some(GraphNode::new("b", "B")));
		assert_eq!(state.context_menu, None);
		assert_eq!(state.selected.as_ref().map(|n| n.id.as_str()), Some("b"));
	}

	#[test]
	fn selection_survives_only_when_node_remains() {
		let mut state = ExplorerState::default();
		state.replace_graph(graph(&["a", "b"]));
		state.select(Some(GraphNode::new("a", "a")));

		state.replace_graph(graph(&["a", "c"]));
		assert_eq!(state.selected.as_ref().map(|n| n.id.as_str()), Some("a"));

		state.replace_graph(graph(&["c"]));
		assert_eq!(state.selected, None);

		state.select(Some(GraphNode::new("c", "c")));
		state.select(None);
		assert_eq!(state.selected, None);
	}

	#[test]
	fn layout_controls_update_settings() {
		let mut state = ExplorerState::default();
		assert_eq!(state.layout, LayoutSettings::default());
		state.set_layout_mode(LayoutMode::Radial);
		state.toggle_aggregation();
		assert_eq!(
			state.layout,
			LayoutSettings {
				mode: LayoutMode::Radial,
				aggregated: true
			}
		);
	}
}
