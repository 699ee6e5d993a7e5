//! Canned-response HTTP server for client tests.
//!
//! Every request, whatever its method or path, is recorded and answered
//! with the next queued response.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

pub type Requests = Arc<Mutex<Vec<RecordedRequest>>>;

#[derive(Clone)]
struct ServerState {
    responses: Arc<Mutex<VecDeque<(u16, &'static str)>>>,
    requests: Requests,
}

/// Serve `responses` (status, body) in order. Returns the base URL and the request log.
pub async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Requests) {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        responses: Arc::new(Mutex::new(responses.into())),
        requests: Arc::clone(&requests),
    };

    let app = Router::new().fallback(respond).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    (format!("http://{addr}"), requests)
}

async fn respond(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, &'static str) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, "no response queued"));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}
