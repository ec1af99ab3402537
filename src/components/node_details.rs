use leptos::prelude::*;

use super::force_graph::GraphNode;

const NO_TYPE: &str = "N/A";
const NO_DESCRIPTION: &str = "No description available.";

/// Side panel for the selected node.
#[component]
pub fn NodeDetails(node: GraphNode, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
	let kind = node
		.kind
		.filter(|k| !k.is_empty())
		.unwrap_or_else(|| NO_TYPE.to_owned());
	let description = node
		.description
		.filter(|d| !d.is_empty())
		.unwrap_or_else(|| NO_DESCRIPTION.to_owned());

	view! {
		<div class="sidebar">
			<button class="close-btn" on:click=move |_| on_close.run(())>"×"</button>
			<h2>"Node Details"</h2>
			<div class="node-info">
				<p><strong>"ID: "</strong>{node.id}</p>
				<p><strong>"Label: "</strong>{node.label}</p>
				<p><strong>"Type: "</strong>{kind}</p>
				<p><strong>"Description: "</strong>{description}</p>
			</div>
		</div>
	}
}
