use serde::{Deserialize, Serialize};

/// Body of both `/api/ask` and `/api/ask-stream`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserQuery {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Success body of `/api/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub response: String,
    pub thread_id: String,
    pub run_id: String,
}

/// Failure body of `/api/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// One unit of the pseudo-stream protocol. Serialized as
/// `{"type": "update" | "done" | "error", "content": ..., ...}`, one JSON
/// object per line on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Update {
        content: String,
    },
    Done {
        content: String,
        thread_id: String,
        run_id: String,
    },
    Error {
        content: String,
    },
}

impl StreamEvent {
    /// Terminal events close the stream; at most one is ever emitted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Update { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_event_wire_shape() {
        let done = StreamEvent::Done {
            content: "4".to_string(),
            thread_id: "thread_1".to_string(),
            run_id: "run_1".to_string(),
        };
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "done",
                "content": "4",
                "thread_id": "thread_1",
                "run_id": "run_1"
            })
        );

        let update = StreamEvent::Update {
            content: "partial".to_string(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "update", "content": "partial"})
        );
    }

    #[test]
    fn terminal_classification() {
        assert!(!StreamEvent::Update {
            content: String::new()
        }
        .is_terminal());
        assert!(StreamEvent::Error {
            content: String::new()
        }
        .is_terminal());
        assert!(StreamEvent::Done {
            content: String::new(),
            thread_id: String::new(),
            run_id: String::new(),
        }
        .is_terminal());
    }

    #[test]
    fn user_query_thread_id_is_optional() {
        let query: UserQuery = serde_json::from_str(r#"{"question": "2+2?"}"#).unwrap();
        assert_eq!(query.question, "2+2?");
        assert!(query.thread_id.is_none());
    }
}
