//! Crate-wide error type.

/// Errors raised while talking to the graph, chat and transcript collaborators.
///
/// Every variant carries owned strings so the error is `Clone` and can travel
/// through both branches of a fanned-out stream.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum AppError {
	#[error("request failed: {0}")]
	Transport(String),

	#[error("server responded with {status}: {message}")]
	Status { status: u16, message: String },

	#[error("malformed {what} response: {reason}")]
	MalformedResponse { what: &'static str, reason: String },

	#[error("missing required field `{0}`")]
	MissingField(&'static str),

	#[error("invalid configuration: {0}")]
	Config(String),
}

impl AppError {
	pub(crate) fn malformed(what: &'static str, reason: impl ToString) -> Self {
		AppError::MalformedResponse {
			what,
			reason: reason.to_string(),
		}
	}
}

impl From<reqwest::Error> for AppError {
	fn from(err: reqwest::Error) -> Self {
		AppError::Transport(err.to_string())
	}
}

impl From<serde_json::Error> for AppError {
	fn from(err: serde_json::Error) -> Self {
		AppError::malformed("json", err)
	}
}

/// Result alias used across the crate.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
