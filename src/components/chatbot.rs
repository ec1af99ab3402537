use std::rc::Rc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::HttpBackend;
use crate::chat::{ChatPanel, load_history, new_session_id, send};
use crate::config::ApiConfig;

/// Chat panel bound to the active session.
///
/// Switching to an existing session loads its history. Sending without an
/// active session starts a new one and reports its id through
/// `on_new_session` once the answer starts streaming.
#[component]
pub fn Chatbot(
	config: ApiConfig,
	#[prop(into)] active_session: Signal<Option<String>>,
	#[prop(into)] on_new_session: Callback<String>,
) -> impl IntoView {
	let config = StoredValue::new(config);
	let panel = RwSignal::new(ChatPanel::default());
	let input = RwSignal::new(String::new());
	// A session started from this panel already shows its conversation.
	let started_here = StoredValue::new(None::<String>);
	let messages_end = NodeRef::<leptos::html::Div>::new();

	Effect::new(move |_| {
		let Some(session_id) = active_session.get() else {
			started_here.set_value(None);
			panel.update(ChatPanel::clear);
			return;
		};
		if started_here.with_value(|s| s.as_deref() == Some(session_id.as_str())) {
			return;
		}
		started_here.set_value(None);
		let backend = HttpBackend::new(config.get_value());
		spawn_local(async move {
			load_history(&panel, &backend, &session_id).await;
		});
	});

	Effect::new(move |_| {
		panel.track();
		if let Some(end) = messages_end.get() {
			end.scroll_into_view();
		}
	});

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let text = input.get_untracked();
		if panel.with_untracked(|p| p.busy) || text.trim().is_empty() {
			return;
		}
		input.set(String::new());

		let (session_id, is_new) = match active_session.get_untracked() {
			Some(id) => (id, false),
			None => (new_session_id(), true),
		};
		if is_new {
			started_here.set_value(Some(session_id.clone()));
		}
		let backend = Rc::new(HttpBackend::new(config.get_value()));
		spawn_local(async move {
			let opened = session_id.clone();
			let on_open = move || {
				if is_new {
					on_new_session.run(opened);
				}
			};
			send(&panel, &*backend, backend.clone(), session_id, &text, on_open).await;
		});
	};

	let busy = move || panel.with(|p| p.busy);

	view! {
		<div class="chatbot-container">
			<div class="chat-messages">
				{move || {
					panel
						.with(|p| {
							p.messages
								.iter()
								.map(|m| {
									let class = format!("message {}", m.role.as_str());
									let content = m.content.clone();
									view! { <div class=class>{content}</div> }
								})
								.collect_view()
						})
				}}
				<div node_ref=messages_end />
			</div>
			<form class="chatbot-form" on:submit=on_submit>
				<input
					class="chatbot-input"
					type="text"
					placeholder="Ask about Unreal Engine..."
					bind:value=input
					disabled=busy
				/>
				<button type="submit" class="chatbot-button" disabled=busy>
					{move || if busy() { "..." } else { "Send" }}
				</button>
			</form>
		</div>
	}
}
