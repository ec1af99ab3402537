//! Conversation shown in the chat panel and the async flows that feed it.

use futures::{StreamExt, join};
use log::{error, info};

use super::message::{ChatMessage, ChatRequest};
use super::turn::{ChatTurn, start_turn};
use crate::api::{ChatHistoryService, CompletionService, TranscriptStore};
use crate::error::AppError;
use crate::handle::StateHandle;

pub const HISTORY_FAILED: &str = "Failed to load chat history.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatPanel {
	pub messages: Vec<ChatMessage>,
	pub busy: bool,
}

impl ChatPanel {
	/// Accepts typed input. Blank input, or input while a request is in
	/// flight, is ignored and returns `None`.
	pub fn submit(&mut self, input: &str) -> Option<String> {
		if self.busy || input.trim().is_empty() {
			return None;
		}
		self.messages.push(ChatMessage::user(input));
		Some(input.to_owned())
	}

	/// Starts the assistant message that answer segments are appended to.
	pub fn open_answer(&mut self) {
		self.messages.push(ChatMessage::assistant(""));
	}

	pub fn append_answer(&mut self, text: &str) {
		match self.messages.last_mut() {
			Some(last) if !last.is_user() => last.content.push_str(text),
			_ => self.messages.push(ChatMessage::assistant(text)),
		}
	}

	pub fn fail(&mut self, err: &AppError) {
		self.messages.push(ChatMessage::assistant(format!(
			"Sorry, I encountered an error: {err}"
		)));
	}

	pub fn clear(&mut self) {
		self.messages.clear();
	}
}

/// Marks the panel busy until dropped.
struct BusyGuard<H: StateHandle<ChatPanel>> {
	handle: H,
}

impl<H: StateHandle<ChatPanel>> BusyGuard<H> {
	fn begin(handle: &H) -> Self {
		handle.apply(|p| p.busy = true);
		Self {
			handle: handle.clone(),
		}
	}
}

impl<H: StateHandle<ChatPanel>> Drop for BusyGuard<H> {
	fn drop(&mut self) {
		self.handle.apply(|p| p.busy = false);
	}
}

/// Replaces the conversation with the stored messages of `session_id`.
pub async fn load_history<H, S>(panel: &H, service: &S, session_id: &str)
where
	H: StateHandle<ChatPanel>,
	S: ChatHistoryService + ?Sized,
{
	let _busy = BusyGuard::begin(panel);
	match service.fetch_messages(session_id).await {
		Ok(messages) => {
			info!("loaded {} messages of session {session_id}", messages.len());
			panel.apply(|p| p.messages = messages);
		}
		Err(err) => {
			error!("Failed to fetch chat history: {err}");
			panel.apply(|p| p.messages = vec![ChatMessage::assistant(HISTORY_FAILED)]);
		}
	}
}

/// Sends `input` as one turn of session `session_id` and streams the
/// answer into the panel.
///
/// `on_open` runs once the completion stream is open. The call returns after
/// the transcript has been written; the panel stops being busy as soon as
/// the answer is complete.
pub async fn send<H, C, T>(
	panel: &H,
	completion: &C,
	store: T,
	session_id: String,
	input: &str,
	on_open: impl FnOnce(),
) where
	H: StateHandle<ChatPanel>,
	C: CompletionService + ?Sized,
	T: TranscriptStore + 'static,
{
	let Some(query) = panel.apply(|p| p.submit(input)).flatten() else {
		return;
	};
	let busy = BusyGuard::begin(panel);

	let ChatTurn {
		mut answers,
		background,
	} = match start_turn(completion, store, ChatRequest::new(query, session_id)).await {
		Ok(turn) => turn,
		Err(err) => {
			error!("Error during chat submission: {err}");
			panel.apply(|p| p.fail(&err));
			return;
		}
	};
	on_open();
	panel.apply(ChatPanel::open_answer);

	let display = async move {
		let _busy = busy;
		while let Some(item) = answers.next().await {
			match item {
				Ok(text) => {
					panel.apply(|p| p.append_answer(&text));
				}
				Err(err) => {
					error!("Error during chat submission: {err}");
					panel.apply(|p| p.fail(&err));
					break;
				}
			}
		}
	};
	join!(display, background);
}
