//! One question/answer exchange with the completion service.

use bytes::Bytes;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use log::info;

use super::extractor::AnswerStream;
use super::fanout::{Branch, fan_out};
use super::message::ChatRequest;
use super::transcript::{TranscriptEntry, record_response};
use crate::api::{CompletionService, TranscriptStore};
use crate::error::Result;

/// A started turn.
///
/// `answers` yields the display text; `background` must be driven to
/// completion (it pumps the response and persists the transcript) and may
/// outlive the reader of `answers`.
pub struct ChatTurn {
	pub answers: AnswerStream<Branch<Result<Bytes>>>,
	pub background: LocalBoxFuture<'static, ()>,
}

/// Validates the request, stores the user's message, then opens the
/// completion stream and splits it between display and transcript.
pub async fn start_turn<C, T>(completion: &C, store: T, request: ChatRequest) -> Result<ChatTurn>
where
	C: CompletionService + ?Sized,
	T: TranscriptStore + 'static,
{
	request.validate()?;
	store
		.append(TranscriptEntry::user(&request.session_id, &request.query))
		.await?;

	let raw = completion.complete(&request).await?;
	info!("completion stream opened for session {}", request.session_id);

	let (display, transcript, pump) = fan_out(raw);
	let record = record_response(transcript, store, request.session_id);
	Ok(ChatTurn {
		answers: AnswerStream::new(display),
		background: future::join(pump, record).map(|_| ()).boxed_local(),
	})
}

#[cfg(test)]
mod tests {
	use std::cell::{Cell, RefCell};
	use std::rc::Rc;

	use async_trait::async_trait;
	use futures::executor::block_on;
	use futures::{StreamExt, join, stream};

	use super::*;
	use crate::api::RawStream;
	use crate::chat::message::Role;
	use crate::error::AppError;

	struct ScriptedCompletion {
		chunks: Vec<&'static str>,
		calls: Cell<usize>,
	}

	impl ScriptedCompletion {
		fn new(chunks: Vec<&'static str>) -> Self {
			Self {
				chunks,
				calls: Cell::new(0),
			}
		}
	}

	#[async_trait(?Send)]
	impl CompletionService for ScriptedCompletion {
		async fn complete(&self, _request: &ChatRequest) -> Result<RawStream> {
			self.calls.set(self.calls.get() + 1);
			let items: Vec<Result<Bytes>> = self
				.chunks
				.iter()
				.map(|c| Ok(Bytes::from_static(c.as_bytes())))
				.collect();
			Ok(stream::iter(items).boxed_local())
		}
	}

	#[derive(Default)]
	struct MemoryStore {
		entries: RefCell<Vec<TranscriptEntry>>,
		reject: bool,
	}

	#[async_trait(?Send)]
	impl TranscriptStore for MemoryStore {
		async fn append(&self, entry: TranscriptEntry) -> Result<()> {
			if self.reject {
				return Err(AppError::Status {
					status: 401,
					message: "unauthorized".into(),
				});
			}
			self.entries.borrow_mut().push(entry);
			Ok(())
		}
	}

	#[test]
	fn display_and_transcript_both_see_the_response() {
		let completion = ScriptedCompletion::new(vec![
			"<thinking>look up Pawn</thinking><ans",
			"wer>A Pawn is ",
			"possessable.</answer>",
		]);
		let store = Rc::new(MemoryStore::default());

		let turn = block_on(start_turn(
			&completion,
			store.clone(),
			ChatRequest::new("What is a Pawn?", "s1"),
		))
		.unwrap();
		let ChatTurn {
			answers,
			background,
		} = turn;
		let (_, shown) = block_on(async { join!(background, answers.collect::<Vec<_>>()) });

		assert_eq!(shown, vec![Ok("A Pawn is possessable.".to_owned())]);
		let entries = store.entries.borrow();
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0], TranscriptEntry::user("s1", "What is a Pawn?"));
		assert_eq!(entries[1].role, Role::Assistant);
		assert_eq!(entries[1].content, "A Pawn is possessable.");
		assert_eq!(entries[1].thinking.as_deref(), Some("look up Pawn"));
	}

	#[test]
	fn transcript_is_written_even_if_display_is_abandoned() {
		let completion = ScriptedCompletion::new(vec!["<answer>kept</answer>"]);
		let store = Rc::new(MemoryStore::default());
		let turn = block_on(start_turn(&completion, store.clone(), ChatRequest::new("q", "s1")))
			.unwrap();

		drop(turn.answers);
		block_on(turn.background);
		assert_eq!(store.entries.borrow()[1].content, "kept");
	}

	#[test]
	fn invalid_request_calls_nothing() {
		let completion = ScriptedCompletion::new(vec![]);
		let store = Rc::new(MemoryStore::default());
		let err = block_on(start_turn(&completion, store.clone(), ChatRequest::new("", "s1")))
			.err();
		assert_eq!(err, Some(AppError::MissingField("query")));
		assert_eq!(completion.calls.get(), 0);
		assert!(store.entries.borrow().is_empty());
	}

	#[test]
	fn failing_to_store_the_question_fails_the_turn() {
		let completion = ScriptedCompletion::new(vec!["<answer>x</answer>"]);
		let store = Rc::new(MemoryStore {
			reject: true,
			..Default::default()
		});
		let result = block_on(start_turn(&completion, store, ChatRequest::new("q", "s1")));
		assert!(matches!(result, Err(AppError::Status { status: 401, .. })));
		assert_eq!(completion.calls.get(), 0);
	}
}
