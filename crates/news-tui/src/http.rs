use crate::core::DeskEvent;
use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{Html, Json},
    routing::get,
    Router,
};
use news_proto::headlines::{self, FeedView};
use news_proto::protocol::{Notice, PlayerBinding, TabStatus};
use news_proto::state::StateManager;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

#[derive(Clone)]
struct HttpState {
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<DeskEvent>,
}

#[derive(Serialize)]
struct ApiState {
    rev: u64,
    channels: Vec<ChannelInfo>,
    active: Option<usize>,
    status: TabStatus,
    player: PlayerBinding,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct ChannelInfo {
    idx: usize,
    id: String,
    label: String,
    active: bool,
}

pub fn router(state_manager: Arc<StateManager>, event_tx: mpsc::Sender<DeskEvent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/activate/:idx", get(activate).post(activate))
        .route("/api/headlines", get(get_headlines))
        .route("/headlines.html", get(get_headlines_html))
        .layer(cors)
        .with_state(HttpState {
            state_manager,
            event_tx,
        })
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<DeskEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state_manager, event_tx);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_state(State(state): State<HttpState>) -> Json<ApiState> {
    let desk = state.state_manager.get_state().await;

    let channels = desk
        .channels
        .iter()
        .enumerate()
        .map(|(idx, c)| ChannelInfo {
            idx,
            id: c.id.clone(),
            label: c.label.clone(),
            active: desk.ui.is_active(idx),
        })
        .collect();

    Json(ApiState {
        rev: desk.rev,
        channels,
        active: desk.ui.active,
        status: desk.ui.status,
        player: desk.ui.player,
        notice: desk.ui.notice,
    })
}

async fn activate(State(state): State<HttpState>, Path(idx): Path<usize>) -> StatusCode {
    let count = state.state_manager.get_state().await.channels.len();
    if idx >= count {
        return StatusCode::NOT_FOUND;
    }
    info!("HTTP API: activate channel {}", idx);
    if state.event_tx.send(DeskEvent::Activate(idx)).await.is_err() {
        error!("Failed to send activate event");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::ACCEPTED
}

async fn get_headlines(State(state): State<HttpState>) -> Json<FeedView> {
    Json(state.state_manager.get_state().await.feed)
}

async fn get_headlines_html(State(state): State<HttpState>) -> Html<String> {
    Html(headlines::render_html(&state.state_manager.get_state().await.feed))
}
