//! reqwest binding of the collaborator traits to the hosted edge functions.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::json;

use super::payload::{parse_graph, parse_messages, parse_sessions, status_error};
use super::{
	ChatHistoryService, CompletionService, GraphService, RawStream, TRACE_MAX_DEPTH,
	TraceDirection, TranscriptStore,
};
use crate::chat::{ChatMessage, ChatRequest, ChatSession, TranscriptEntry};
use crate::components::force_graph::GraphData;
use crate::config::ApiConfig;
use crate::error::{AppError, Result};

const TRANSCRIPT_TABLE: &str = "chat_history";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TraceRequest<'a> {
	node_id: &'a str,
	direction: TraceDirection,
	max_depth: u32,
}

/// Talks to `get-graph-data`, `trace-graph`, `get-chat-history`, the
/// configured completion function and the transcript table.
#[derive(Clone, Debug)]
pub struct HttpBackend {
	client: Client,
	config: ApiConfig,
}

impl HttpBackend {
	pub fn new(config: ApiConfig) -> Self {
		Self::with_client(Client::new(), config)
	}

	pub fn with_client(client: Client, config: ApiConfig) -> Self {
		Self { client, config }
	}

	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
		let mut request = request;
		if let Some(key) = &self.config.anon_key {
			request = request.header("apikey", key);
		}
		let bearer = self
			.config
			.access_token
			.as_ref()
			.or(self.config.anon_key.as_ref());
		match bearer {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}

	fn post_function(&self, function: &str, body: &impl Serialize) -> RequestBuilder {
		let url = self.config.function_url(function);
		debug!("POST {url}");
		self.authorized(self.client.post(url)).json(body)
	}

	async fn call(&self, function: &str, body: &impl Serialize) -> Result<Response> {
		let response = self.post_function(function, body).send().await?;
		ensure_success(response).await
	}

	async fn call_text(&self, function: &str, body: &impl Serialize) -> Result<String> {
		Ok(self.call(function, body).await?.text().await?)
	}
}

async fn ensure_success(response: Response) -> Result<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let body = response.text().await.unwrap_or_default();
	Err(status_error(status.as_u16(), &body))
}

#[async_trait(?Send)]
impl GraphService for HttpBackend {
	async fn fetch_graph(&self) -> Result<GraphData> {
		parse_graph(&self.call_text("get-graph-data", &json!({})).await?)
	}

	async fn trace(&self, node_id: &str, direction: TraceDirection) -> Result<GraphData> {
		if node_id.is_empty() {
			return Err(AppError::MissingField("nodeId"));
		}
		let body = TraceRequest {
			node_id,
			direction,
			max_depth: TRACE_MAX_DEPTH,
		};
		parse_graph(&self.call_text("trace-graph", &body).await?)
	}
}

#[async_trait(?Send)]
impl ChatHistoryService for HttpBackend {
	async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
		parse_sessions(&self.call_text("get-chat-history", &json!({})).await?)
	}

	async fn fetch_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
		let body = json!({ "sessionId": session_id });
		parse_messages(&self.call_text("get-chat-history", &body).await?)
	}
}

#[async_trait(?Send)]
impl CompletionService for HttpBackend {
	async fn complete(&self, request: &ChatRequest) -> Result<RawStream> {
		request.validate()?;
		let response = self.call(&self.config.completion_function, request).await?;
		Ok(response.bytes_stream().map_err(AppError::from).boxed_local())
	}
}

#[async_trait(?Send)]
impl TranscriptStore for HttpBackend {
	async fn append(&self, entry: TranscriptEntry) -> Result<()> {
		let url = self.config.table_url(TRANSCRIPT_TABLE);
		let response = self
			.authorized(self.client.post(&url))
			.header("Prefer", "return=minimal")
			.json(&entry)
			.send()
			.await?;
		ensure_success(response).await.map(drop)
	}
}
