use leptos::prelude::*;

use crate::api::TraceDirection;
use crate::controller::ContextMenu;

/// Trace actions for the node a menu was opened on.
#[component]
pub fn NodeContextMenu(
	menu: ContextMenu,
	#[prop(into)] on_trace: Callback<TraceDirection>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	let style = format!("position: absolute; top: {}px; left: {}px;", menu.y, menu.x);

	view! {
		<div class="context-menu" style=style>
			<ul>
				<li on:click=move |_| on_trace.run(TraceDirection::Upstream)>"Trace Upstream"</li>
				<li on:click=move |_| on_trace.run(TraceDirection::Downstream)>"Trace Downstream"</li>
				<li on:click=move |_| on_close.run(())>"Close"</li>
			</ul>
		</div>
	}
}
