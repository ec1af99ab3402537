use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::executor::block_on;
use futures::{StreamExt, join, stream};
use knowledge_graph_explorer::api::{CompletionService, RawStream, TranscriptStore};
use knowledge_graph_explorer::chat::{
	AnswerStream, ChatRequest, ChatTurn, Role, TranscriptEntry, start_turn,
};
use knowledge_graph_explorer::error::Result;

const SAMPLE: &str = "noise<thinking>x</thinking><answer>Hello</answer>tail";

fn byte_chunks(parts: Vec<Vec<u8>>) -> impl futures::Stream<Item = Result<Bytes>> + Unpin {
	stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))).collect::<Vec<_>>())
}

fn displayed(parts: Vec<Vec<u8>>) -> String {
	let answers = AnswerStream::new(byte_chunks(parts));
	block_on(answers.map(|item| item.unwrap()).collect::<String>())
}

#[test]
fn every_three_way_chunking_shows_only_the_answer() {
	let bytes = SAMPLE.as_bytes();
	for i in 0..=bytes.len() {
		for j in i..=bytes.len() {
			let parts = vec![
				bytes[..i].to_vec(),
				bytes[i..j].to_vec(),
				bytes[j..].to_vec(),
			];
			assert_eq!(displayed(parts), "Hello", "split at {i}/{j}");
		}
	}
}

#[test]
fn single_bytes_equal_one_chunk() {
	let singles = SAMPLE.bytes().map(|b| vec![b]).collect();
	assert_eq!(displayed(singles), displayed(vec![SAMPLE.as_bytes().to_vec()]));
}

struct Replay(&'static [&'static str]);

#[async_trait(?Send)]
impl CompletionService for Replay {
	async fn complete(&self, _request: &ChatRequest) -> Result<RawStream> {
		let parts = self.0.iter().map(|p| p.as_bytes().to_vec()).collect();
		Ok(byte_chunks(parts).boxed_local())
	}
}

#[derive(Default)]
struct Transcript(RefCell<Vec<TranscriptEntry>>);

#[async_trait(?Send)]
impl TranscriptStore for Transcript {
	async fn append(&self, entry: TranscriptEntry) -> Result<()> {
		self.0.borrow_mut().push(entry);
		Ok(())
	}
}

#[test]
fn display_and_transcript_agree_on_the_answer() {
	let completion = Replay(&[
		"<thinking>The user asks about ",
		"Actors.</thinking>\n<answer>An Actor is any object ",
		"placed in a level.</answer>",
	]);
	let transcript = Rc::new(Transcript::default());

	let ChatTurn {
		answers,
		background,
	} = block_on(start_turn(
		&completion,
		transcript.clone(),
		ChatRequest::new("What is an Actor?", "session-1"),
	))
	.unwrap();
	let (_, shown) = block_on(async { join!(background, answers.collect::<Vec<_>>()) });

	let shown: String = shown.into_iter().map(|s| s.unwrap()).collect();
	let entries = transcript.0.borrow();
	assert_eq!(shown, "An Actor is any object placed in a level.");
	assert_eq!(entries[0].role, Role::User);
	assert_eq!(entries[1].content, shown);
	assert_eq!(entries[1].thinking.as_deref(), Some("The user asks about Actors."));
}

#[test]
fn truncated_answer_is_reported_not_shown() {
	let mut answers = AnswerStream::new(byte_chunks(vec![
		b"<answer>first</answer><answer>never fin".to_vec(),
	]));
	let shown: Vec<String> = block_on(async {
		let mut out = Vec::new();
		while let Some(item) = answers.next().await {
			out.push(item.unwrap());
		}
		out
	});
	assert_eq!(shown, vec!["first".to_owned()]);
	assert_eq!(
		answers.unterminated().map(|u| u.buffered.as_str()),
		Some("never fin")
	);
}
