pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle states reported by the upstream run API. Unknown strings
/// deserialize to `Other` so new upstream statuses keep the poll loop alive
/// instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    RequiresAction,
    Cancelling,
    Incomplete,
    #[serde(other)]
    Other,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Other => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// The `{ value }` wrapper the upstream puts around message text.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextValue {
    pub value: String,
}

/// One entry of a message's content array. Non-text blocks carry no `text`
/// field.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextValue>,
}

/// One turn of a thread as returned by the message listing. The upstream
/// returns these newest-first; callers scanning for "the latest assistant
/// reply" rely on that ordering.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ThreadMessage {
    /// Text of the first content block, if the block exists and is textual.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| block.text.as_ref())
            .map(|t| t.value.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid API key format: {0}")]
    InvalidCredential(String),
}

/// Boundary to the hosted assistant service. Everything the relay needs is
/// behind this trait so tests can script a fake upstream.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Create a new thread and return its id.
    async fn create_thread(&self) -> Result<String, AssistantError>;

    /// Append a user message carrying `content` to the thread.
    async fn add_user_message(&self, thread_id: &str, content: &str)
        -> Result<(), AssistantError>;

    /// Start a run of the configured assistant over the thread.
    async fn create_run(&self, thread_id: &str) -> Result<String, AssistantError>;

    /// Fetch the run's current status.
    async fn run_status(&self, thread_id: &str, run_id: &str)
        -> Result<RunStatus, AssistantError>;

    /// List the thread's messages, newest-first per the upstream contract.
    async fn list_messages(&self, thread_id: &str)
        -> Result<Vec<ThreadMessage>, AssistantError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_parses_known_and_unknown_strings() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);

        let status: RunStatus = serde_json::from_str("\"some_future_state\"").unwrap();
        assert_eq!(status, RunStatus::Other);
    }

    #[test]
    fn first_text_skips_blocks_without_text() {
        let msg: ThreadMessage = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type": "image_file"}]
        }))
        .unwrap();
        assert_eq!(msg.first_text(), None);

        let msg: ThreadMessage = serde_json::from_value(serde_json::json!({
            "id": "msg_2",
            "role": "assistant",
            "content": [{"type": "text", "text": {"value": "hello"}}]
        }))
        .unwrap();
        assert_eq!(msg.first_text(), Some("hello"));
    }

    #[test]
    fn message_content_defaults_to_empty() {
        let msg: ThreadMessage = serde_json::from_value(serde_json::json!({
            "id": "msg_3",
            "role": "assistant"
        }))
        .unwrap();
        assert!(msg.content.is_empty());
        assert_eq!(msg.first_text(), None);
    }
}
