//! Wire records of the graph and chat endpoints, and their conversion into
//! the crate's own types.

use std::collections::BTreeMap;

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::chat::{ChatMessage, ChatSession};
use crate::components::force_graph::{AttributeValue, GraphData, GraphLink, GraphNode};
use crate::error::{AppError, Result};

#[derive(Deserialize)]
struct GraphRecord {
	nodes: Vec<NodeRecord>,
	links: Vec<LinkRecord>,
}

#[derive(Deserialize)]
struct NodeRecord {
	id: String,
	label: String,
	#[serde(rename = "type", default)]
	kind: Option<String>,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	group: Option<String>,
	#[serde(flatten)]
	extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct LinkRecord {
	source: String,
	target: String,
	label: String,
	#[serde(flatten)]
	extra: Map<String, Value>,
}

impl From<NodeRecord> for GraphNode {
	fn from(record: NodeRecord) -> Self {
		let extra = attributes(&record.id, record.extra);
		GraphNode {
			id: record.id,
			label: record.label,
			kind: record.kind,
			description: record.description,
			group: record.group,
			extra,
		}
	}
}

impl From<LinkRecord> for GraphLink {
	fn from(record: LinkRecord) -> Self {
		let owner = format!("{}->{}", record.source, record.target);
		GraphLink {
			extra: attributes(&owner, record.extra),
			source: record.source,
			target: record.target,
			label: record.label,
		}
	}
}

// Keeps primitive properties; lists and maps have no place in the panel.
fn attributes(owner: &str, raw: Map<String, Value>) -> BTreeMap<String, AttributeValue> {
	raw.into_iter()
		.filter_map(|(key, value)| {
			let attr = match value {
				Value::String(s) => AttributeValue::Text(s),
				Value::Bool(b) => AttributeValue::Bool(b),
				Value::Number(n) => AttributeValue::Number(n.as_f64()?),
				Value::Null => return None,
				Value::Array(_) | Value::Object(_) => {
					warn!("dropping non-primitive property `{key}` of {owner}");
					return None;
				}
			};
			Some((key, attr))
		})
		.collect()
}

/// Decodes a `{ nodes, links }` snapshot.
pub fn parse_graph(body: &str) -> Result<GraphData> {
	let record: GraphRecord =
		serde_json::from_str(body).map_err(|e| AppError::malformed("graph", e))?;
	Ok(GraphData {
		nodes: record.nodes.into_iter().map(GraphNode::from).collect(),
		links: record.links.into_iter().map(GraphLink::from).collect(),
	})
}

/// Decodes the session list. Anything other than an array is read as no
/// sessions at all.
pub fn parse_sessions(body: &str) -> Result<Vec<ChatSession>> {
	let value: Value = serde_json::from_str(body)?;
	if !value.is_array() {
		warn!("session list is not an array, showing no history");
		return Ok(Vec::new());
	}
	serde_json::from_value(value).map_err(|e| AppError::malformed("session list", e))
}

/// Decodes the ordered messages of one session.
pub fn parse_messages(body: &str) -> Result<Vec<ChatMessage>> {
	serde_json::from_str(body).map_err(|e| AppError::malformed("chat history", e))
}

/// Builds the error for a non-success response. JSON bodies contribute
/// their `error` field; anything else is used as plain text.
pub fn status_error(status: u16, body: &str) -> AppError {
	let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
		v.get("error")
			.and_then(Value::as_str)
			.map(str::to_owned)
	});
	AppError::Status {
		status,
		message: from_json.unwrap_or_else(|| body.trim().to_owned()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chat::Role;

	#[test]
	fn graph_with_properties() {
		let body = r#"{
			"nodes": [
				{"id": "1", "label": "Pawn", "group": "Class", "type": "Class",
				 "description": "Base class", "name": "Pawn", "since": 4.0,
				 "tags": ["a", "b"], "deprecated": false, "owner": null},
				{"id": "2", "label": "Actor"}
			],
			"links": [{"source": "1", "target": "2", "label": "DEPENDS_ON", "weight": 2}]
		}"#;
		let data = parse_graph(body).unwrap();

		let pawn = &data.nodes[0];
		assert_eq!(pawn.kind.as_deref(), Some("Class"));
		assert_eq!(pawn.group.as_deref(), Some("Class"));
		assert_eq!(pawn.description.as_deref(), Some("Base class"));
		assert_eq!(pawn.extra.get("since"), Some(&AttributeValue::Number(4.0)));
		assert_eq!(pawn.extra.get("deprecated"), Some(&AttributeValue::Bool(false)));
		assert!(!pawn.extra.contains_key("tags"));
		assert!(!pawn.extra.contains_key("owner"));
		assert!(!pawn.extra.contains_key("type"));

		assert_eq!(data.nodes[1], GraphNode::new("2", "Actor"));
		assert_eq!(data.links[0].label, "DEPENDS_ON");
		assert_eq!(data.links[0].extra.get("weight"), Some(&AttributeValue::Number(2.0)));
	}

	#[test]
	fn missing_fields_are_malformed() {
		let err = parse_graph(r#"{"nodes": []}"#).unwrap_err();
		assert!(matches!(err, AppError::MalformedResponse { what: "graph", .. }));

		let err = parse_graph(r#"{"nodes": [{"id": "1"}], "links": []}"#).unwrap_err();
		assert!(err.to_string().contains("label"));
	}

	#[test]
	fn empty_graph_is_valid() {
		assert!(parse_graph(r#"{"nodes": [], "links": []}"#).unwrap().is_empty());
	}

	#[test]
	fn sessions_tolerate_non_arrays() {
		let list = parse_sessions(
			r#"[{"session_id": "s1", "first_message": "hi", "last_updated": "2024-05-01T10:00:00Z"}]"#,
		)
		.unwrap();
		assert_eq!(list[0].session_id, "s1");
		assert!(parse_sessions(r#"{"unexpected": true}"#).unwrap().is_empty());
		assert!(parse_sessions("null").unwrap().is_empty());
		assert!(parse_sessions("not json").is_err());
	}

	#[test]
	fn messages_ignore_extra_columns() {
		let msgs = parse_messages(
			r#"[{"id": 7, "session_id": "s1", "role": "user", "content": "q", "created_at": "x"},
			    {"role": "assistant", "content": "a", "thinking_steps": "t"}]"#,
		)
		.unwrap();
		assert_eq!(msgs.len(), 2);
		assert_eq!(msgs[0].role, Role::User);
		assert_eq!(msgs[1], ChatMessage::assistant("a"));
	}

	#[test]
	fn status_errors_prefer_the_json_error_field() {
		assert_eq!(
			status_error(400, r#"{"error": "Missing nodeId or direction"}"#),
			AppError::Status {
				status: 400,
				message: "Missing nodeId or direction".into()
			}
		);
		assert_eq!(
			status_error(500, "Neo4j connection refused\n"),
			AppError::Status {
				status: 500,
				message: "Neo4j connection refused".into()
			}
		);
	}
}
