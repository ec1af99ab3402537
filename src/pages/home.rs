use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::api::{ChatHistoryService, HttpBackend, TraceDirection};
use crate::chat::ChatSession;
use crate::components::chatbot::Chatbot;
use crate::components::context_menu::NodeContextMenu;
use crate::components::force_graph::{ForceGraphCanvas, GraphNode, LayoutMode};
use crate::components::history_sidebar::HistorySidebar;
use crate::components::node_details::NodeDetails;
use crate::config::ApiConfig;
use crate::controller::{ExplorerState, reload, trace};

/// Explorer page: history sidebar, graph with its controls, and chat panel.
#[component]
pub fn Home() -> impl IntoView {
	let explorer = RwSignal::new(ExplorerState::default());
	let config = match ApiConfig::from_env() {
		Ok(config) => config,
		Err(err) => {
			error!("{err}, falling back to {}", ApiConfig::default().base_url);
			explorer.update(|s| s.error = Some(err.to_string()));
			ApiConfig::default()
		}
	};
	let chat_config = config.clone();
	let config = StoredValue::new(config);

	// Graph
	let snapshot = Memo::new(move |_| explorer.with(|s| s.snapshot().clone()));
	let settings = Memo::new(move |_| explorer.with(|s| s.layout));
	let loading = move || explorer.with(|s| s.loading);

	let run_reload = move || {
		let backend = HttpBackend::new(config.get_value());
		spawn_local(async move { reload(&explorer, &backend).await });
	};
	run_reload();

	let on_trace = Callback::new(move |direction: TraceDirection| {
		let menu_node = explorer.with_untracked(|s| s.context_menu.as_ref().map(|m| m.node.id.clone()));
		let Some(node_id) = menu_node else {
			return;
		};
		let backend = HttpBackend::new(config.get_value());
		spawn_local(async move { trace(&explorer, &backend, &node_id, direction).await });
	});

	// Chat sessions
	let active_session = RwSignal::new(None::<String>);
	let chat_list_version = RwSignal::new(0u32);
	let sessions = RwSignal::new(Vec::<ChatSession>::new());
	let sessions_error = RwSignal::new(None::<String>);

	Effect::new(move |_| {
		chat_list_version.track();
		let backend = HttpBackend::new(config.get_value());
		spawn_local(async move {
			match backend.list_sessions().await {
				Ok(list) => {
					sessions.try_set(list);
					sessions_error.try_set(None);
				}
				Err(err) => {
					error!("Failed to fetch chat sessions: {err}");
					sessions_error.try_set(Some(format!("Failed to load sessions: {err}")));
				}
			}
		});
	});

	let on_new_session = move |session_id: String| {
		active_session.set(Some(session_id));
		chat_list_version.update(|v| *v += 1);
	};

	view! {
		<div class="App">
			<HistorySidebar
				sessions=sessions
				active=active_session
				error=sessions_error
				on_select=move |id: String| active_session.set(Some(id))
				on_new_chat=move |_: ()| active_session.set(None)
			/>
			<div class="app-main-content">
				<header class="App-header">
					<h1>"Unreal Engine Knowledge Graph"</h1>
					<div class="layout-controls">
						<button
							on:click=move |_| explorer.update(|s| s.set_layout_mode(LayoutMode::Force))
							disabled=move || loading() || settings.get().mode == LayoutMode::Force
						>
							"Force"
						</button>
						<button
							on:click=move |_| explorer.update(|s| s.set_layout_mode(LayoutMode::Radial))
							disabled=move || loading() || settings.get().mode == LayoutMode::Radial
						>
							"Radial"
						</button>
						<button
							on:click=move |_| explorer.update(|s| s.toggle_aggregation())
							disabled=loading
						>
							{move || if settings.get().aggregated { "Ungroup" } else { "Group by Label" }}
						</button>
					</div>
					<button class="reset-btn" on:click=move |_| run_reload() disabled=loading>
						{move || if loading() { "Loading..." } else { "Reset View" }}
					</button>
				</header>
				<main class="main-content">
					{move || {
						explorer
							.with(|s| s.error.clone())
							.map(|e| view! { <div class="error-message">"Error: " {e}</div> })
					}}
					<div class="graph-container">
						<ForceGraphCanvas
							snapshot=snapshot
							settings=settings
							on_select={move |node: Option<GraphNode>| explorer.update(|s| s.select(node))}
							on_context_menu=move |(node, x, y): (GraphNode, f64, f64)| {
								explorer.update(|s| s.open_context_menu(node, x, y))
							}
							on_background_click=move |_: ()| explorer.update(|s| s.background_click())
						/>
						{move || {
							explorer
								.with(|s| s.context_menu.clone())
								.map(|menu| {
									view! {
										<NodeContextMenu
											menu=menu
											on_trace=on_trace
											on_close=move |_: ()| explorer.update(|s| s.close_context_menu())
										/>
									}
								})
						}}
						{move || {
							explorer
								.with(|s| s.selected.clone())
								.map(|node| {
									view! {
										<NodeDetails
											node=node
											on_close=move |_: ()| explorer.update(|s| s.select(None))
										/>
									}
								})
						}}
					</div>
				</main>
			</div>
			<Chatbot
				config=chat_config
				active_session=active_session
				on_new_session=on_new_session
			/>
		</div>
	}
}
