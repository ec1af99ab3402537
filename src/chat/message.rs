//! Chat records shared by the panel, the history sidebar and the backend.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Assistant => "assistant",
		}
	}
}

/// One line of the visible conversation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
	pub role: Role,
	pub content: String,
}

impl ChatMessage {
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: Role::User,
			content: content.into(),
		}
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self {
			role: Role::Assistant,
			content: content.into(),
		}
	}

	pub fn is_user(&self) -> bool {
		self.role == Role::User
	}
}

/// A past conversation as listed in the history sidebar.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatSession {
	pub session_id: String,
	pub first_message: String,
	/// ISO-8601 timestamp as stored by the backend.
	pub last_updated: String,
}

/// Body of a retrieval-augmented completion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
	pub query: String,
	pub session_id: String,
}

impl ChatRequest {
	pub fn new(query: impl Into<String>, session_id: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			session_id: session_id.into(),
		}
	}

	/// Both fields must be non-blank before anything is sent or stored.
	pub fn validate(&self) -> Result<()> {
		if self.query.trim().is_empty() {
			return Err(AppError::MissingField("query"));
		}
		if self.session_id.trim().is_empty() {
			return Err(AppError::MissingField("sessionId"));
		}
		Ok(())
	}
}

/// Fresh identifier for a new conversation.
pub fn new_session_id() -> String {
	uuid::Uuid::new_v4().to_string()
}
