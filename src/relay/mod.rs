use crate::assistant::{AssistantError, AssistantService, MessageRole, RunStatus, ThreadMessage};
use crate::models::StreamEvent;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_stream::wrappers::ReceiverStream;

/// Emitted as the `done` content when a completed run left nothing readable
/// in the thread. Streaming treats that case as benign rather than an error.
pub const NO_CONTENT_PLACEHOLDER: &str = "No content in assistant response";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Assistant processing timed out")]
    Timeout,

    #[error("Assistant run failed with status: {0}")]
    RunFailed(RunStatus),

    #[error("No assistant response found")]
    NoResponse,

    #[error("Error extracting content from assistant response")]
    ContentExtraction,

    #[error(transparent)]
    Upstream(#[from] AssistantError),
}

/// What the poll loop should do after observing a run status. Both the
/// synchronous and the streaming path share this transition table; the sync
/// path layers its elapsed-time bound on top, the streaming path its poll
/// cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    Continue(RunStatus),
    Complete,
    Fail(RunStatus),
}

impl From<RunStatus> for PollAction {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => PollAction::Complete,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                PollAction::Fail(status)
            }
            other => PollAction::Continue(other),
        }
    }
}

/// Result of scanning a message listing for the latest assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Extraction {
    Text(String),
    /// No assistant-role message in the listing.
    NoAssistantMessage,
    /// Assistant message present but its content array is empty.
    EmptyContent,
    /// Assistant message has a content block with no readable text.
    Malformed,
}

/// Takes the listing in the order the upstream returned it; correctness of
/// "latest reply" depends on the upstream listing newest-first.
fn extract_latest_assistant(messages: &[ThreadMessage]) -> Extraction {
    let Some(message) = messages.iter().find(|m| m.role == MessageRole::Assistant) else {
        return Extraction::NoAssistantMessage;
    };
    if message.content.is_empty() {
        return Extraction::EmptyContent;
    }
    match message.first_text() {
        Some(text) => Extraction::Text(text.to_string()),
        None => Extraction::Malformed,
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Delay between status polls, and the streaming loop's initial delay.
    pub poll_interval: Duration,
    /// Total elapsed bound for the synchronous mode.
    pub sync_timeout: Duration,
    /// Maximum polls in streaming mode before giving up with an error event.
    pub stream_poll_cap: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            sync_timeout: Duration::from_secs(60),
            stream_poll_cap: 600,
        }
    }
}

/// A successful synchronous exchange.
#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    pub thread_id: String,
    pub run_id: String,
}

/// Bridges one question to the upstream thread/run lifecycle. All state
/// lives upstream; the relay holds only the client and its timing knobs, so
/// one instance serves every request concurrently.
pub struct Relay {
    service: Arc<dyn AssistantService>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(service: Arc<dyn AssistantService>, config: RelayConfig) -> Self {
        Self { service, config }
    }

    /// Ensure a thread exists, append the question, start a run. Shared by
    /// both modes; in streaming mode this happens before the event stream
    /// is constructed so its faults surface as a degenerate error stream.
    pub async fn prepare(
        &self,
        question: &str,
        thread_id: Option<String>,
    ) -> Result<(String, String), RelayError> {
        let thread_id = match thread_id {
            Some(id) => id,
            None => self.service.create_thread().await?,
        };
        self.service.add_user_message(&thread_id, question).await?;
        let run_id = self.service.create_run(&thread_id).await?;
        info!("Dispatched run {} on thread {}", run_id, thread_id);
        Ok((thread_id, run_id))
    }

    /// Synchronous mode: block the caller's task until the run terminates
    /// or the timeout elapses, then return the assistant's reply.
    pub async fn ask(
        &self,
        question: &str,
        thread_id: Option<String>,
    ) -> Result<Answer, RelayError> {
        let (thread_id, run_id) = self.prepare(question, thread_id).await?;
        let started = Instant::now();

        loop {
            if started.elapsed() > self.config.sync_timeout {
                warn!("Run {} exceeded sync timeout", run_id);
                return Err(RelayError::Timeout);
            }

            let status = self.service.run_status(&thread_id, &run_id).await?;
            match PollAction::from(status) {
                PollAction::Complete => break,
                PollAction::Fail(status) => {
                    warn!("Run {} terminated with status {}", run_id, status);
                    return Err(RelayError::RunFailed(status));
                }
                PollAction::Continue(status) => {
                    debug!("Run {} still {}", run_id, status);
                    sleep(self.config.poll_interval).await;
                }
            }
        }

        let messages = self.service.list_messages(&thread_id).await?;
        match extract_latest_assistant(&messages) {
            Extraction::Text(response) => Ok(Answer {
                response,
                thread_id,
                run_id,
            }),
            Extraction::NoAssistantMessage => Err(RelayError::NoResponse),
            Extraction::EmptyContent | Extraction::Malformed => {
                Err(RelayError::ContentExtraction)
            }
        }
    }

    /// Streaming mode: poll on a spawned task and yield events through a
    /// channel. The loop stops on its own when the receiver is dropped,
    /// which covers client disconnects.
    pub fn stream_events(&self, thread_id: String, run_id: String) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(32);
        let service = self.service.clone();
        let interval = self.config.poll_interval;
        let poll_cap = self.config.stream_poll_cap;

        tokio::spawn(async move {
            // Give the run a moment to start before the first status fetch.
            sleep(interval).await;

            let mut polls = 0u32;
            loop {
                if polls >= poll_cap {
                    warn!("Run {} still not terminal after {} polls", run_id, poll_cap);
                    let _ = tx
                        .send(StreamEvent::Error {
                            content: format!(
                                "Run did not finish within {} polls",
                                poll_cap
                            ),
                        })
                        .await;
                    return;
                }
                polls += 1;

                let status = match service.run_status(&thread_id, &run_id).await {
                    Ok(status) => status,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error {
                                content: e.to_string(),
                            })
                            .await;
                        return;
                    }
                };

                match PollAction::from(status) {
                    PollAction::Complete => {
                        let event = match service.list_messages(&thread_id).await {
                            Ok(messages) => match extract_latest_assistant(&messages) {
                                Extraction::Text(content) => StreamEvent::Done {
                                    content,
                                    thread_id: thread_id.clone(),
                                    run_id: run_id.clone(),
                                },
                                Extraction::NoAssistantMessage | Extraction::EmptyContent => {
                                    StreamEvent::Done {
                                        content: NO_CONTENT_PLACEHOLDER.to_string(),
                                        thread_id: thread_id.clone(),
                                        run_id: run_id.clone(),
                                    }
                                }
                                Extraction::Malformed => StreamEvent::Error {
                                    content: RelayError::ContentExtraction.to_string(),
                                },
                            },
                            Err(e) => StreamEvent::Error {
                                content: e.to_string(),
                            },
                        };
                        let _ = tx.send(event).await;
                        return;
                    }
                    PollAction::Fail(status) => {
                        let _ = tx
                            .send(StreamEvent::Error {
                                content: format!("Run failed with status: {}", status),
                            })
                            .await;
                        return;
                    }
                    PollAction::Continue(RunStatus::InProgress) => {
                        // Relay whatever partial reply is visible so far.
                        if let Ok(messages) = service.list_messages(&thread_id).await {
                            if let Extraction::Text(content) =
                                extract_latest_assistant(&messages)
                            {
                                if tx.send(StreamEvent::Update { content }).await.is_err() {
                                    debug!("Client went away, stopping poll loop");
                                    return;
                                }
                            }
                        }
                    }
                    PollAction::Continue(_) => {}
                }

                sleep(interval).await;
            }
        });

        ReceiverStream::new(rx)
    }
}
