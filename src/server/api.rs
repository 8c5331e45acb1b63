use crate::models::{AssistantResponse, ErrorBody, StreamEvent, UserQuery};
use crate::relay::{Relay, RelayError};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::{Stream, StreamExt};
use log::{error, info};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

pub fn router(relay: Arc<Relay>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ask", post(ask_handler))
        .route("/api/ask-stream", post(ask_stream_handler))
        .layer(cors)
        .with_state(AppState { relay })
}

fn error_status(err: &RelayError) -> StatusCode {
    match err {
        RelayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn ask_handler(State(state): State<AppState>, Json(query): Json<UserQuery>) -> Response {
    info!("ask: question of {} chars", query.question.len());

    match state.relay.ask(&query.question, query.thread_id).await {
        Ok(answer) => Json(AssistantResponse {
            response: answer.response,
            thread_id: answer.thread_id,
            run_id: answer.run_id,
        })
        .into_response(),
        Err(e) => {
            error!("ask failed: {}", e);
            (
                error_status(&e),
                Json(ErrorBody {
                    detail: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Serialize each event onto its own line of a `text/event-stream` body.
/// Faults travel in-band, so the status here is always 200.
fn event_stream_response<S>(events: S) -> Response
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let lines = events.map(|event| {
        let mut line = serde_json::to_string(&event).unwrap_or_else(|e| {
            error!("Failed to serialize stream event: {}", e);
            r#"{"type":"error","content":"event serialization failed"}"#.to_string()
        });
        line.push('\n');
        Ok::<_, Infallible>(Bytes::from(line))
    });

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(lines),
    )
        .into_response()
}

async fn ask_stream_handler(
    State(state): State<AppState>,
    Json(query): Json<UserQuery>,
) -> Response {
    info!("ask-stream: question of {} chars", query.question.len());

    match state.relay.prepare(&query.question, query.thread_id).await {
        Ok((thread_id, run_id)) => {
            event_stream_response(state.relay.stream_events(thread_id, run_id))
        }
        Err(e) => {
            // Setup failed before any event could flow; report it as a
            // single-event stream rather than an HTTP error.
            error!("ask-stream setup failed: {}", e);
            event_stream_response(tokio_stream::once(StreamEvent::Error {
                content: e.to_string(),
            }))
        }
    }
}
