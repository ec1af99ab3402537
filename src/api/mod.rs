//! Collaborator interfaces for graph data, chat history, completions and the
//! transcript store.
//!
//! The UI and the chat orchestration only see these traits; [`HttpBackend`]
//! implements all of them against the hosted edge functions, and tests plug
//! in in-memory fakes.

use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::LocalBoxStream;
use serde::Serialize;

use crate::chat::{ChatMessage, ChatRequest, ChatSession, TranscriptEntry};
use crate::components::force_graph::GraphData;
use crate::error::Result;

mod http;
mod payload;

pub use http::HttpBackend;
pub use payload::{parse_graph, parse_messages, parse_sessions, status_error};

/// Longest dependency path followed by a trace.
pub const TRACE_MAX_DEPTH: u32 = 10;

/// Undecoded response body of a completion, chunk by chunk.
pub type RawStream = LocalBoxStream<'static, Result<Bytes>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TraceDirection {
	/// Everything the node depends on.
	Upstream,
	/// Everything that depends on the node.
	Downstream,
}

#[async_trait(?Send)]
pub trait GraphService {
	/// The initial overview snapshot.
	async fn fetch_graph(&self) -> Result<GraphData>;

	/// Dependency paths of at most [`TRACE_MAX_DEPTH`] hops from `node_id`.
	async fn trace(&self, node_id: &str, direction: TraceDirection) -> Result<GraphData>;
}

#[async_trait(?Send)]
pub trait ChatHistoryService {
	async fn list_sessions(&self) -> Result<Vec<ChatSession>>;

	async fn fetch_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>>;
}

#[async_trait(?Send)]
pub trait CompletionService {
	async fn complete(&self, request: &ChatRequest) -> Result<RawStream>;
}

#[async_trait(?Send)]
pub trait TranscriptStore {
	async fn append(&self, entry: TranscriptEntry) -> Result<()>;
}

#[async_trait(?Send)]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Rc<T> {
	async fn append(&self, entry: TranscriptEntry) -> Result<()> {
		(**self).append(entry).await
	}
}

#[async_trait(?Send)]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
	async fn append(&self, entry: TranscriptEntry) -> Result<()> {
		(**self).append(entry).await
	}
}
