//! Streaming chat: answer extraction, fan-out and transcript persistence.

mod extractor;
mod fanout;
mod message;
mod panel;
mod transcript;
mod turn;

pub use extractor::{AnswerExtractor, AnswerStream, END_TAG, ExtractorState, START_TAG, UnterminatedAnswer};
pub use fanout::{Branch, fan_out};
pub use message::{ChatMessage, ChatRequest, ChatSession, Role, new_session_id};
pub use panel::{ChatPanel, HISTORY_FAILED, load_history, send};
pub use transcript::{FALLBACK_ANSWER, TranscriptEntry, record_response};
pub use turn::{ChatTurn, start_turn};
