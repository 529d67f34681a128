//! HTTP and websocket surface of the arena service.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use gauntlet_types::{Action, AdminEvent, ErrorKind, Payout, Session};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::announce::Announcement;
use crate::host::{ArenaHost, HostError};

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<ArenaHost>,
    pub announcements: broadcast::Sender<Announcement>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/signup", post(open_signup))
        .route("/sessions/:id/tributes", post(register))
        .route("/sessions/:id/start", post(start))
        .route("/sessions/:id/actions", post(submit_action))
        .route("/sessions/:id/bets", post(place_bet))
        .route("/sessions/:id/next-day", post(force_next_day))
        .route("/sessions/:id/events", post(admin_event))
        .route("/sessions/:id/stop", post(stop))
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError(pub HostError);

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::ConcurrencyGuard => StatusCode::CONFLICT,
            ErrorKind::UnexpectedFault => {
                warn!(err = %self.0, "request failed unexpectedly");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub time_remaining_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartBody {
    #[serde(default)]
    pub npcs: usize,
}

#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub tribute: String,
    pub action: Action,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BetBody {
    pub bettor: String,
    pub tribute: String,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct BetReceipt {
    pub total_stake: u64,
}

#[derive(Debug, Serialize)]
pub struct EventLines {
    pub lines: Vec<String>,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let session = state.host.handle(&id).await?.snapshot().await?;
    let time_remaining_ms = if session.is_running() {
        session.time_remaining_ms(state.host.now_ms())
    } else {
        0
    };
    Ok(Json(SessionView {
        session,
        time_remaining_ms,
    }))
}

async fn open_signup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.host.handle(&id).await?.open_signup().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<StatusCode> {
    state
        .host
        .handle(&id)
        .await?
        .register(&body.id, &body.name)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<StartBody>>,
) -> ApiResult<StatusCode> {
    let npcs = body.map(|Json(body)| body.npcs).unwrap_or_default();
    state.host.handle(&id).await?.start(npcs).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActionBody>,
) -> ApiResult<StatusCode> {
    state
        .host
        .handle(&id)
        .await?
        .submit_action(&body.tribute, body.action, body.zone.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn place_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BetBody>,
) -> ApiResult<Json<BetReceipt>> {
    let total_stake = state
        .host
        .handle(&id)
        .await?
        .place_bet(&body.bettor, &body.tribute, body.amount)
        .await?;
    Ok(Json(BetReceipt { total_stake }))
}

async fn force_next_day(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.host.handle(&id).await?.force_next_day().await?;
    Ok(StatusCode::ACCEPTED)
}

async fn admin_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<AdminEvent>,
) -> ApiResult<Json<EventLines>> {
    let lines = state.host.handle(&id).await?.admin(event).await?;
    Ok(Json(EventLines { lines }))
}

async fn stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Payout>>> {
    let payouts = state.host.handle(&id).await?.stop().await?;
    Ok(Json(payouts))
}

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Only forward announcements for this session.
    #[serde(default)]
    pub session: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.session))
}

async fn handle_socket(socket: WebSocket, state: AppState, filter: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut announcements = state.announcements.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let forward_task = tokio::spawn(async move {
        loop {
            match announcements.recv().await {
                Ok(announcement) => {
                    if filter
                        .as_deref()
                        .is_some_and(|wanted| wanted != announcement.session_id)
                    {
                        continue;
                    }
                    if let Ok(payload) = serde_json::to_string(&announcement) {
                        if tx.send(Message::Text(payload)).is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging; announcements dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // The socket is read-only; drain until the client leaves.
    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Close(_) = message {
            break;
        }
    }

    write_task.abort();
    forward_task.abort();
}
