//! Incremental extraction of `<answer>` sections from a raw model stream.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::warn;

use crate::error::Result;

pub const START_TAG: &str = "<answer>";
pub const END_TAG: &str = "</answer>";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractorState {
	#[default]
	SeekingStart,
	InAnswer,
}

/// Answer text that was still waiting for `</answer>` when the stream ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnterminatedAnswer {
	pub buffered: String,
}

/// Emits only the text inside `<answer>...</answer>`, however the input is
/// split into chunks. Nothing is emitted for a section until its closing tag
/// has been seen.
#[derive(Debug, Default)]
pub struct AnswerExtractor {
	state: ExtractorState,
	buffer: String,
	undecoded: Vec<u8>,
}

impl AnswerExtractor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> ExtractorState {
		self.state
	}

	/// Feeds one chunk and returns the answer text completed by it, if any.
	/// Several sections completed by the same chunk are concatenated.
	pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
		self.decode(chunk);
		self.scan()
	}

	/// Ends the stream. Reports what was lost if a section never closed.
	pub fn finish(&mut self) -> Option<UnterminatedAnswer> {
		if !self.undecoded.is_empty() {
			self.buffer
				.push_str(&String::from_utf8_lossy(&self.undecoded));
			self.undecoded.clear();
		}
		let state = std::mem::take(&mut self.state);
		let buffered = std::mem::take(&mut self.buffer);
		(state == ExtractorState::InAnswer).then_some(UnterminatedAnswer { buffered })
	}

	// Appends every complete UTF-8 sequence to `buffer`; a sequence cut off
	// at the end of the chunk waits in `undecoded` for the next one.
	fn decode(&mut self, chunk: &[u8]) {
		self.undecoded.extend_from_slice(chunk);
		let mut start = 0;
		loop {
			match std::str::from_utf8(&self.undecoded[start..]) {
				Ok(text) => {
					self.buffer.push_str(text);
					start = self.undecoded.len();
					break;
				}
				Err(err) => {
					let valid = start + err.valid_up_to();
					if let Ok(text) = std::str::from_utf8(&self.undecoded[start..valid]) {
						self.buffer.push_str(text);
					}
					match err.error_len() {
						Some(len) => {
							self.buffer.push(char::REPLACEMENT_CHARACTER);
							start = valid + len;
						}
						None => {
							start = valid;
							break;
						}
					}
				}
			}
		}
		self.undecoded.drain(..start);
	}

	fn scan(&mut self) -> Option<String> {
		let mut emitted = String::new();
		loop {
			match self.state {
				ExtractorState::SeekingStart => match self.buffer.find(START_TAG) {
					Some(pos) => {
						self.buffer.drain(..pos + START_TAG.len());
						self.state = ExtractorState::InAnswer;
					}
					None => {
						self.keep_partial_start_tag();
						break;
					}
				},
				ExtractorState::InAnswer => match self.buffer.find(END_TAG) {
					Some(pos) => {
						emitted.push_str(&self.buffer[..pos]);
						self.buffer.drain(..pos + END_TAG.len());
						self.state = ExtractorState::SeekingStart;
					}
					None => break,
				},
			}
		}
		(!emitted.is_empty()).then_some(emitted)
	}

	// Outside a section only a tail that could begin `<answer>` matters.
	fn keep_partial_start_tag(&mut self) {
		let keep = (1..START_TAG.len())
			.rev()
			.find(|&n| self.buffer.ends_with(&START_TAG[..n]))
			.unwrap_or(0);
		let cut = self.buffer.len() - keep;
		self.buffer.drain(..cut);
	}
}

/// Runs a raw byte stream through an [`AnswerExtractor`], yielding answer
/// segments as their closing tags arrive.
pub struct AnswerStream<S> {
	inner: S,
	extractor: AnswerExtractor,
	unterminated: Option<UnterminatedAnswer>,
	done: bool,
}

impl<S> AnswerStream<S> {
	pub fn new(inner: S) -> Self {
		Self {
			inner,
			extractor: AnswerExtractor::new(),
			unterminated: None,
			done: false,
		}
	}

	/// Set once the stream has ended inside an unclosed `<answer>`.
	pub fn unterminated(&self) -> Option<&UnterminatedAnswer> {
		self.unterminated.as_ref()
	}
}

impl<S> Stream for AnswerStream<S>
where
	S: Stream<Item = Result<Bytes>> + Unpin,
{
	type Item = Result<String>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();
		if this.done {
			return Poll::Ready(None);
		}
		loop {
			match ready!(this.inner.poll_next_unpin(cx)) {
				Some(Ok(chunk)) => {
					if let Some(text) = this.extractor.push(&chunk) {
						return Poll::Ready(Some(Ok(text)));
					}
				}
				Some(Err(err)) => return Poll::Ready(Some(Err(err))),
				None => {
					this.done = true;
					if let Some(lost) = this.extractor.finish() {
						warn!(
							"stream ended inside <answer>; {} bytes never displayed",
							lost.buffered.len()
						);
						this.unterminated = Some(lost);
					}
					return Poll::Ready(None);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use futures::stream;

	use super::*;
	use crate::error::AppError;

	const SAMPLE: &str = "noise<thinking>x</thinking><answer>Hello</answer>tail";

	fn feed(chunks: &[&[u8]]) -> String {
		let mut extractor = AnswerExtractor::new();
		chunks.iter().filter_map(|c| extractor.push(c)).collect()
	}

	#[test]
	fn single_chunk() {
		assert_eq!(feed(&[SAMPLE.as_bytes()]), "Hello");
	}

	#[test]
	fn every_two_way_split() {
		let bytes = SAMPLE.as_bytes();
		for at in 0..=bytes.len() {
			let (a, b) = bytes.split_at(at);
			assert_eq!(feed(&[a, b]), "Hello", "split at {at}");
		}
	}

	#[test]
	fn one_byte_at_a_time() {
		let chunks: Vec<&[u8]> = SAMPLE.as_bytes().chunks(1).collect();
		assert_eq!(feed(&chunks), "Hello");
	}

	#[test]
	fn multiple_sections_concatenate_in_order() {
		let input = "<thinking>a</thinking><answer>One, </answer>mid<answer>two</answer>";
		assert_eq!(feed(&[input.as_bytes()]), "One, two");

		let chunks: Vec<&[u8]> = input.as_bytes().chunks(3).collect();
		assert_eq!(feed(&chunks), "One, two");
	}

	#[test]
	fn nothing_is_flushed_before_the_end_tag() {
		let mut extractor = AnswerExtractor::new();
		assert_eq!(extractor.push(b"<answer>partial text </ans"), None);
		assert_eq!(extractor.state(), ExtractorState::InAnswer);
		assert_eq!(extractor.push(b"wer>"), Some("partial text ".into()));
		assert_eq!(extractor.state(), ExtractorState::SeekingStart);
	}

	#[test]
	fn multibyte_characters_survive_byte_splits() {
		let input = "<answer>Größe: 世界 🚀</answer>";
		let chunks: Vec<&[u8]> = input.as_bytes().chunks(1).collect();
		assert_eq!(feed(&chunks), "Größe: 世界 🚀");
	}

	#[test]
	fn invalid_bytes_become_replacement_characters() {
		assert_eq!(feed(&[b"<answer>a\xffb</answer>"]), "a\u{fffd}b");
	}

	#[test]
	fn unterminated_section_is_reported_not_emitted() {
		let mut extractor = AnswerExtractor::new();
		assert_eq!(extractor.push(b"<answer>cut off"), None);
		assert_eq!(
			extractor.finish(),
			Some(UnterminatedAnswer {
				buffered: "cut off".into()
			})
		);

		let mut clean = AnswerExtractor::new();
		clean.push(b"<answer>ok</answer>trailing");
		assert_eq!(clean.finish(), None);
	}

	#[test]
	fn noise_outside_sections_is_not_retained() {
		let mut extractor = AnswerExtractor::new();
		extractor.push(&[b'x'; 4096]);
		extractor.push(b"<ans");
		assert!(extractor.buffer.len() <= START_TAG.len());
		assert_eq!(extractor.push(b"wer>kept</answer>"), Some("kept".into()));
	}

	#[test]
	fn answer_stream_yields_segments_and_flags_truncation() {
		let chunks = ["<thinking>t</thinking><ans", "wer>Hi</answer><answer>lost"]
			.into_iter()
			.map(|c| Ok(Bytes::from_static(c.as_bytes())));
		let mut answers = AnswerStream::new(stream::iter(chunks));

		let segments: Vec<String> = block_on(async {
			let mut out = Vec::new();
			while let Some(item) = answers.next().await {
				out.push(item.unwrap());
			}
			out
		});
		assert_eq!(segments, vec!["Hi".to_owned()]);
		assert_eq!(answers.unterminated().map(|u| u.buffered.as_str()), Some("lost"));
	}

	#[test]
	fn answer_stream_passes_errors_through() {
		let chunks = vec![
			Ok(Bytes::from_static(b"<answer>a</answer>")),
			Err(AppError::Transport("reset".into())),
		];
		let items: Vec<_> = block_on(AnswerStream::new(stream::iter(chunks)).collect());
		assert_eq!(
			items,
			vec![Ok("a".to_owned()), Err(AppError::Transport("reset".into()))]
		);
	}
}
