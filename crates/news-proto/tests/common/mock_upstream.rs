//! Local stand-ins for the live-search endpoint and the headline host.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

pub const LIVE_CHANNEL: &str = "UClive";
pub const OFF_CHANNEL: &str = "UCoff";
pub const FAILING_CHANNEL: &str = "UCfail";
pub const JUNK_CHANNEL: &str = "UCjunk";
pub const LIVE_VIDEO: &str = "vid123";

/// Bind `router` on an ephemeral loopback port and serve it in the background.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe local addr");
    drop(listener);
    addr
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub headers: Arc<Mutex<Vec<HeaderMap>>>,
}

impl Recorder {
    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.queries.lock().expect("recorder lock").clone()
    }

    pub fn headers(&self) -> Vec<HeaderMap> {
        self.headers.lock().expect("recorder lock").clone()
    }
}

async fn search(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    rec.queries.lock().expect("recorder lock").push(query.clone());
    let channel = query.get("channelId").cloned().unwrap_or_default();
    match channel.as_str() {
        LIVE_CHANNEL => (
            StatusCode::OK,
            format!(
                r#"{{"kind":"youtube#searchListResponse","items":[{{"id":{{"kind":"youtube#video","videoId":"{}"}}}}]}}"#,
                LIVE_VIDEO
            ),
        )
            .into_response(),
        FAILING_CHANNEL => (StatusCode::INTERNAL_SERVER_ERROR, "backend error").into_response(),
        JUNK_CHANNEL => (StatusCode::OK, "<html>quota exceeded</html>").into_response(),
        _ => (StatusCode::OK, r#"{"kind":"youtube#searchListResponse","items":[]}"#).into_response(),
    }
}

/// Search mock: live for `LIVE_CHANNEL`, HTTP 500 for `FAILING_CHANNEL`,
/// a non-JSON body for `JUNK_CHANNEL`, empty `items` for everything else.
pub async fn search_server() -> (String, Recorder) {
    let rec = Recorder::default();
    let router = Router::new()
        .route("/youtube/v3/search", get(search))
        .with_state(rec.clone());
    let addr = serve(router).await;
    (format!("http://{}/youtube/v3/search", addr), rec)
}

#[derive(Clone)]
struct FeedState {
    rec: Recorder,
    body: Arc<Mutex<(StatusCode, String)>>,
}

async fn feed(
    State(state): State<FeedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.rec.queries.lock().expect("recorder lock").push(query);
    state.rec.headers.lock().expect("recorder lock").push(headers);
    let (status, body) = state.body.lock().expect("body lock").clone();
    (status, body).into_response()
}

/// Headline host serving whatever was last put into the returned slot.
pub async fn feed_server(
    status: StatusCode,
    body: &str,
) -> (String, Recorder, Arc<Mutex<(StatusCode, String)>>) {
    let rec = Recorder::default();
    let slot = Arc::new(Mutex::new((status, body.to_string())));
    let router = Router::new()
        .route("/data/top_news.json", get(feed))
        .with_state(FeedState {
            rec: rec.clone(),
            body: slot.clone(),
        });
    let addr = serve(router).await;
    (format!("http://{}/data/top_news.json", addr), rec, slot)
}
