//! Persisting complete assistant responses.

use std::sync::LazyLock;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{error, info};
use regex::Regex;
use serde::Serialize;

use super::message::Role;
use crate::api::TranscriptStore;
use crate::error::Result;

/// Stored when the response never contained an `<answer>` section.
pub const FALLBACK_ANSWER: &str = "Sorry, I could not generate a valid answer.";

static THINKING: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)<thinking>(.*?)</thinking>").expect("valid regex")
});
static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)<answer>(.*?)</answer>").expect("valid regex")
});

/// One row of a session transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
	pub session_id: String,
	pub role: Role,
	pub content: String,
	#[serde(rename = "thinking_steps", skip_serializing_if = "Option::is_none")]
	pub thinking: Option<String>,
}

impl TranscriptEntry {
	pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			session_id: session_id.into(),
			role: Role::User,
			content: content.into(),
			thinking: None,
		}
	}

	/// Splits a complete raw response into its thinking and answer sections.
	pub fn from_response(session_id: impl Into<String>, response: &str) -> Self {
		let section = |re: &Regex| {
			re.captures(response)
				.and_then(|c| c.get(1))
				.map(|m| m.as_str().trim().to_owned())
		};
		Self {
			session_id: session_id.into(),
			role: Role::Assistant,
			content: section(&ANSWER).unwrap_or_else(|| FALLBACK_ANSWER.to_owned()),
			thinking: Some(section(&THINKING).unwrap_or_default()),
		}
	}
}

/// Drains the transcript branch of a response and stores it as one
/// assistant entry. Failures are logged, never returned.
pub async fn record_response<S, T>(branch: S, store: T, session_id: String)
where
	S: Stream<Item = Result<Bytes>>,
	T: TranscriptStore,
{
	let mut branch = std::pin::pin!(branch);
	let mut raw = Vec::new();
	while let Some(chunk) = branch.next().await {
		match chunk {
			Ok(bytes) => raw.extend_from_slice(&bytes),
			Err(err) => {
				error!("response stream for session {session_id} failed, transcript not saved: {err}");
				return;
			}
		}
	}

	let entry = TranscriptEntry::from_response(session_id, &String::from_utf8_lossy(&raw));
	match store.append(entry).await {
		Ok(()) => info!("saved assistant response ({} bytes)", raw.len()),
		Err(err) => error!("Failed to save assistant response: {err}"),
	}
}
