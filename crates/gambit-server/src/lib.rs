//! HTTP/WebSocket edge for the gambit coordination backend.
//!
//! Three routes carry the whole product:
//! - `POST /api/queue/join` — enter or poll the matching queue;
//! - `GET  /api/game/{game_id}/ws` — upgrade to a game channel;
//! - `POST /api/game/{game_id}/video-token` — mint a video credential.
//!
//! The edge holds no game state. Every request resolves a game id to a
//! room handle and forwards; unknown ids stop here as 404s so typos
//! never materialize rooms.

mod settings;
mod ws;

pub use settings::ServerSettings;

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use gambit_media::{HttpMediaService, MediaError, MediaService};
use gambit_protocol::{
    GameId, QueueJoinRequest, QueueJoinResponse, QueueStatus, Side,
    VideoTokenRequest, VideoTokenResponse,
};
use gambit_room::{JoinOutcome, QueueError, QueueHandle, RoomError, RoomManager};
use gambit_store::{FileStore, Store, StoreError};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

/// Errors the binary can hit while starting up or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state passed to every handler.
///
/// The manager sits behind a mutex because `lookup` may spawn an actor;
/// the lock is held only for handle resolution, never across room I/O.
pub struct AppState {
    rooms: Mutex<RoomManager>,
    queue: QueueHandle,
    app_id: String,
}

impl AppState {
    /// Wires up state over explicit store and media implementations.
    /// Tests inject in-memory doubles here.
    pub fn new(
        store: Arc<dyn Store>,
        media: Arc<dyn MediaService>,
        app_id: impl Into<String>,
        video_preset: impl Into<String>,
    ) -> Self {
        Self {
            rooms: Mutex::new(RoomManager::new(
                store.clone(),
                media,
                video_preset,
            )),
            queue: QueueHandle::spawn(store),
            app_id: app_id.into(),
        }
    }
}

/// Builds production state from settings: file store, HTTP media vendor.
pub async fn build_state(
    settings: &ServerSettings,
) -> Result<Arc<AppState>, ServerError> {
    let store = Arc::new(FileStore::open(&settings.data_dir).await?);
    let media = Arc::new(HttpMediaService::new(settings.media.clone())?);
    let app_id = settings.media.app_id.clone();
    Ok(Arc::new(AppState::new(
        store,
        media,
        app_id,
        settings.video_preset.clone(),
    )))
}

/// Builds the router. CORS is wide open: players arrive from arbitrary
/// web origins and every payload is already untrusted input.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/queue/join", post(join_queue))
        .route("/api/game/:game_id/ws", get(game_ws))
        .route("/api/game/:game_id/video-token", post(video_token))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Request-level failure, rendered as `{"error": "..."}` JSON.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("game not found")]
    NotFound,
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Queue(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            // A vendor failure is the vendor's fault, not ours.
            ApiError::Room(RoomError::Media(e)) => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Room(RoomError::Unavailable(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::Room(_) => {
                tracing::error!(error = %self, "request failed internally");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn healthz() -> &'static str {
    "ok"
}

async fn join_queue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueueJoinRequest>,
) -> Result<Json<QueueJoinResponse>, ApiError> {
    let outcome = state.queue.join(request.player_id).await?;

    let response = match outcome {
        JoinOutcome::Waiting {
            player_id,
            provisional_game_id,
        } => QueueJoinResponse {
            status: QueueStatus::Waiting,
            player_id,
            game_id: provisional_game_id,
            assigned_side: Side::First,
            peer_id: None,
        },
        JoinOutcome::Matched {
            player_id,
            game_id,
            side,
            peer_id,
        } => {
            // The pairing event makes the game playable. Registering on
            // both deliveries is fine; register is idempotent.
            state.rooms.lock().await.register(&game_id);
            QueueJoinResponse {
                status: QueueStatus::Matched,
                player_id,
                game_id,
                assigned_side: side,
                peer_id: Some(peer_id),
            }
        }
    };
    Ok(Json(response))
}

async fn game_ws(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let game_id = GameId(game_id);
    let room = state
        .rooms
        .lock()
        .await
        .lookup(&game_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(upgrade.on_upgrade(move |socket| ws::drive(socket, room)))
}

async fn video_token(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    Json(request): Json<VideoTokenRequest>,
) -> Result<Json<VideoTokenResponse>, ApiError> {
    let game_id = GameId(game_id);
    let room = state
        .rooms
        .lock()
        .await
        .lookup(&game_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let display_name = request
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "player".to_string());
    let grant = room.video_credential(display_name).await?;

    Ok(Json(VideoTokenResponse {
        auth_token: grant.auth_token,
        app_id: state.app_id.clone(),
        meeting_id: grant.meeting_id,
    }))
}
