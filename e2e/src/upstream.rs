//! Mock upstream that simulates the hosted inference provider
//!
//! Serves both upstream conventions: `POST /v1/chat/completions` (model in the
//! body) and `POST /models/*model` (model in the path). Tests queue responses
//! per model via SharedUpstreamState before each request.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::Response,
    routing::post,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::types::{MockResponse, ReceivedRequest, SharedUpstreamState, UpstreamState};

/// Default response when nothing is queued for a model
fn default_completion_response() -> MockResponse {
    MockResponse::json(
        r#"{"id":"chatcmpl-default","object":"chat.completion","created":1700000000,"choices":[{"index":0,"message":{"role":"assistant","content":"Default response (no mock queued)"},"finish_reason":"stop"}]}"#,
    )
}

/// Handle both generation routes - serves pre-configured mock responses
async fn handle_generation(State(state): State<SharedUpstreamState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body_bytes = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap_or_default();
    let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    let model = match path.strip_prefix("/models/") {
        Some(model) => model.to_string(),
        None => body_json
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
    };

    // Pop the next configured response for this model (or use default)
    let mock_response = {
        let mut state = state.lock().unwrap();
        let response = state
            .response_queues
            .get_mut(&model)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(default_completion_response);
        state.received_requests.push(ReceivedRequest {
            model,
            status: response.status,
            path,
            authorization,
            body: body_json,
        });
        response
    };

    Response::builder()
        .status(mock_response.status)
        .header("Content-Type", &mock_response.content_type)
        .body(Body::from(mock_response.body))
        .unwrap()
}

/// Start the mock upstream server and return the shared state handle
pub async fn start(port: u16) -> anyhow::Result<SharedUpstreamState> {
    let state: SharedUpstreamState = std::sync::Arc::new(std::sync::Mutex::new(UpstreamState::default()));

    let app = Router::new()
        .route("/v1/chat/completions", post(handle_generation))
        .route("/models/*model", post(handle_generation))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind mock upstream to {}: {}", addr, e))?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock upstream server failed");
    });

    // Brief pause to let the server start accepting connections
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    Ok(state)
}

/// Queue the next response for `model`
pub fn queue_response(state: &SharedUpstreamState, model: &str, response: MockResponse) {
    state
        .lock()
        .unwrap()
        .response_queues
        .entry(model.to_string())
        .or_default()
        .push_back(response);
}

/// All requests received since last reset
pub fn received_requests(state: &SharedUpstreamState) -> Vec<ReceivedRequest> {
    state.lock().unwrap().received_requests.clone()
}

/// Clear queued responses and the request log
pub fn reset(state: &SharedUpstreamState) {
    let mut s = state.lock().unwrap();
    s.response_queues.clear();
    s.received_requests.clear();
}
