use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient, Response,
};
use serde::{Deserialize, Serialize};

use super::{AssistantError, AssistantService, RunStatus, ThreadMessage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for the hosted Assistants v2 thread/run API.
pub struct OpenAIAssistantClient {
    http: HttpClient,
    base_url: String,
    assistant_id: String,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct ObjectWithId {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    status: RunStatus,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAIAssistantClient {
    pub fn new(
        api_key: &str,
        assistant_id: String,
        base_url: Option<String>,
    ) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AssistantError::InvalidCredential(e.to_string()))?,
        );

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            assistant_id,
        })
    }

    async fn check(resp: Response) -> Result<Response, AssistantError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = match resp.json::<ApiErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unrecognized error response")
                .to_string(),
        };
        Err(AssistantError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AssistantService for OpenAIAssistantClient {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let url = format!("{}/threads", self.base_url);
        let resp = self.http.post(&url).json(&serde_json::json!({})).send().await?;
        let thread: ObjectWithId = Self::check(resp).await?.json().await?;
        debug!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<(), AssistantError> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let req = CreateMessageRequest {
            role: "user",
            content,
        };
        let resp = self.http.post(&url).json(&req).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<String, AssistantError> {
        let url = format!("{}/threads/{}/runs", self.base_url, thread_id);
        let req = CreateRunRequest {
            assistant_id: &self.assistant_id,
        };
        let resp = self.http.post(&url).json(&req).send().await?;
        let run: ObjectWithId = Self::check(resp).await?.json().await?;
        debug!("Created run {} on thread {}", run.id, thread_id);
        Ok(run.id)
    }

    async fn run_status(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, AssistantError> {
        let url = format!("{}/threads/{}/runs/{}", self.base_url, thread_id, run_id);
        let resp = self.http.get(&url).send().await?;
        let run: RunObject = Self::check(resp).await?.json().await?;
        Ok(run.status)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let resp = self.http.get(&url).send().await?;
        let list: MessageList = Self::check(resp).await?.json().await?;
        Ok(list.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenAIAssistantClient::new(
            "sk-test",
            "asst_1".to_string(),
            Some("https://example.test/v1/".to_string()),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://example.test/v1");
    }

    #[test]
    fn control_characters_in_key_are_rejected() {
        let err = OpenAIAssistantClient::new("bad\nkey", "asst_1".to_string(), None);
        assert!(matches!(err, Err(AssistantError::InvalidCredential(_))));
    }

    #[test]
    fn run_object_deserializes_status() {
        let run: RunObject = serde_json::from_value(serde_json::json!({
            "id": "run_1",
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::Completed);
    }
}
