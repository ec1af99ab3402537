use leptos::prelude::*;
use wasm_bindgen::JsValue;

use crate::chat::ChatSession;

/// Formats an ISO-8601 timestamp in the browser's locale.
fn local_timestamp(iso: &str) -> String {
	js_sys::Date::new(&JsValue::from_str(iso))
		.to_locale_string("default", &JsValue::UNDEFINED)
		.into()
}

/// List of past conversations plus the "new chat" action.
#[component]
pub fn HistorySidebar(
	#[prop(into)] sessions: Signal<Vec<ChatSession>>,
	#[prop(into)] active: Signal<Option<String>>,
	#[prop(into)] error: Signal<Option<String>>,
	#[prop(into)] on_select: Callback<String>,
	#[prop(into)] on_new_chat: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="chat-history-sidebar">
			<div class="sidebar-header">
				<h2>"Chat History"</h2>
				<button class="new-chat-btn" on:click=move |_| on_new_chat.run(())>
					"+ New Chat"
				</button>
			</div>
			{move || error.get().map(|e| view! { <p class="error-message">{e}</p> })}
			<div class="session-list">
				<For
					each=move || sessions.get()
					key=|session| session.session_id.clone()
					children=move |session| {
						let id = session.session_id.clone();
						let is_active = {
							let id = id.clone();
							move || active.get().as_deref() == Some(id.as_str())
						};
						view! {
							<div
								class="session-item"
								class:active=is_active
								on:click=move |_| on_select.run(id.clone())
							>
								<p class="session-title">{session.first_message}</p>
								<p class="session-timestamp">
									{local_timestamp(&session.last_updated)}
								</p>
							</div>
						}
					}
				/>
			</div>
		</div>
	}
}
