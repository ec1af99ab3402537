//! Build-time configuration for the collaborator endpoints.

use log::Level;

use crate::error::{AppError, Result};

/// Base URL used when `GRAPH_EXPLORER_API_URL` is not set at build time.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:54321";

/// Edge function streaming the raw tagged completion (`<thinking>` and
/// `<answer>` blocks). It must not store transcript rows or strip tags
/// itself, since the client does both.
pub const DEFAULT_COMPLETION_FUNCTION: &str = "rag-complete";

/// Where the graph, chat and transcript services live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	pub base_url: String,
	pub anon_key: Option<String>,
	pub access_token: Option<String>,
	pub completion_function: String,
}

impl ApiConfig {
	/// Reads the values baked in at compile time.
	pub fn from_env() -> Result<Self> {
		let config = Self::from_values(
			option_env!("GRAPH_EXPLORER_API_URL"),
			option_env!("GRAPH_EXPLORER_ANON_KEY"),
			option_env!("GRAPH_EXPLORER_ACCESS_TOKEN"),
		)?;
		match option_env!("GRAPH_EXPLORER_COMPLETION_FUNCTION") {
			Some(name) => config.with_completion_function(name),
			None => Ok(config),
		}
	}

	pub fn from_values(
		base_url: Option<&str>,
		anon_key: Option<&str>,
		access_token: Option<&str>,
	) -> Result<Self> {
		let base_url = base_url.unwrap_or(DEFAULT_API_URL).trim();
		if base_url.is_empty() {
			return Err(AppError::Config("base url is empty".into()));
		}
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(AppError::Config(format!(
				"base url `{base_url}` must use http or https"
			)));
		}

		let non_empty = |v: Option<&str>| {
			v.map(str::trim)
				.filter(|v| !v.is_empty())
				.map(str::to_owned)
		};

		Ok(Self {
			base_url: base_url.trim_end_matches('/').to_owned(),
			anon_key: non_empty(anon_key),
			access_token: non_empty(access_token),
			completion_function: DEFAULT_COMPLETION_FUNCTION.to_owned(),
		})
	}

	/// Points chat completions at another edge function.
	pub fn with_completion_function(mut self, name: &str) -> Result<Self> {
		let name = name.trim();
		if name.is_empty() || name.contains('/') {
			return Err(AppError::Config(format!(
				"completion function `{name}` is not a function name"
			)));
		}
		self.completion_function = name.to_owned();
		Ok(self)
	}

	/// URL of an edge function, e.g. `trace-graph`.
	pub fn function_url(&self, name: &str) -> String {
		format!("{}/functions/v1/{name}", self.base_url)
	}

	/// URL of a REST table endpoint.
	pub fn table_url(&self, table: &str) -> String {
		format!("{}/rest/v1/{table}", self.base_url)
	}
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_API_URL.to_owned(),
			anon_key: None,
			access_token: None,
			completion_function: DEFAULT_COMPLETION_FUNCTION.to_owned(),
		}
	}
}

/// Console log level, overridable with `GRAPH_EXPLORER_LOG`.
pub fn log_level() -> Level {
	option_env!("GRAPH_EXPLORER_LOG")
		.and_then(|v| v.parse().ok())
		.unwrap_or(Level::Debug)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_to_local_stack() {
		let config = ApiConfig::from_values(None, None, None).unwrap();
		assert_eq!(config.base_url, DEFAULT_API_URL);
		assert_eq!(config.anon_key, None);
		assert_eq!(config.completion_function, DEFAULT_COMPLETION_FUNCTION);
		assert_eq!(config, ApiConfig::default());
	}

	#[test]
	fn completion_function_is_configurable() {
		let config = ApiConfig::default()
			.with_completion_function(" kimi-raw ")
			.unwrap();
		assert_eq!(config.completion_function, "kimi-raw");
		assert!(ApiConfig::default().with_completion_function("").is_err());
		assert!(ApiConfig::default().with_completion_function("a/b").is_err());
	}

	#[test]
	fn trims_trailing_slash_and_blank_keys() {
		let config =
			ApiConfig::from_values(Some("https://demo.example.co/"), Some("  "), Some("tok"))
				.unwrap();
		assert_eq!(config.base_url, "https://demo.example.co");
		assert_eq!(config.anon_key, None);
		assert_eq!(config.access_token.as_deref(), Some("tok"));
		assert_eq!(
			config.function_url("trace-graph"),
			"https://demo.example.co/functions/v1/trace-graph"
		);
		assert_eq!(
			config.table_url("chat_history"),
			"https://demo.example.co/rest/v1/chat_history"
		);
	}

	#[test]
	fn rejects_non_http_urls() {
		let err = ApiConfig::from_values(Some("ftp://nope"), None, None).unwrap_err();
		assert!(matches!(err, AppError::Config(_)));
		assert!(ApiConfig::from_values(Some(" "), None, None).is_err());
	}
}
