//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor is the single writer for its game
//! record — the position and the video session id — so persist-then-
//! broadcast ordering and check-then-create exclusivity both fall out of
//! command serialization rather than locks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gambit_media::MediaService;
use gambit_protocol::{GameId, MoveDescriptor, ServerFrame};
use gambit_rules::STARTING_FEN;
use gambit_store::Store;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// Counter for generating unique channel IDs across all rooms.
static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one live connection attached to a room.
///
/// A game ID names the game; a channel ID names one WebSocket bound to
/// it. Two tabs for the same player get two channel IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Allocates a fresh ID, unique for the lifetime of the process.
    pub fn next() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Channel sender for delivering outbound frames to one connection.
pub type FrameSender = mpsc::UnboundedSender<ServerFrame>;

/// A video join grant for one participant.
#[derive(Debug, Clone)]
pub struct VideoGrant {
    /// Single-use credential for the participant.
    pub auth_token: String,
    /// The game's shared video session id.
    pub meeting_id: String,
}

/// What a room needs besides its own state. Cloned into each actor.
#[derive(Clone)]
pub(crate) struct RoomDeps {
    pub store: Arc<dyn Store>,
    pub media: Arc<dyn MediaService>,
    /// Vendor preset name applied to every join credential.
    pub video_preset: String,
}

/// The durable record for one game, stored as JSON under `game/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GameRecord {
    /// Canonical position, absent until the first connection arrives.
    pub fen: Option<String>,
    /// Shared video session, absent until the first token request.
    pub video_session_id: Option<String>,
}

/// Store key for a game's record.
pub(crate) fn record_key(game_id: &GameId) -> String {
    format!("game/{game_id}")
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the
/// caller sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Attach a connection; replies with the current position.
    Connect {
        channel: ChannelId,
        sender: FrameSender,
        reply: oneshot::Sender<String>,
    },

    /// A move submitted over a connection (fire-and-forget; the
    /// outcome arrives as a frame on that connection's sender).
    SubmitMove {
        channel: ChannelId,
        mv: MoveDescriptor,
    },

    /// Rewind the game to the starting position.
    Reset { channel: ChannelId },

    /// Mint a video join credential, creating the session on first use.
    VideoCredential {
        display_name: String,
        reply: oneshot::Sender<Result<VideoGrant, RoomError>>,
    },

    /// Detach a connection.
    Disconnect { channel: ChannelId },
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. The
/// `RoomManager` holds one of these per game.
#[derive(Clone)]
pub struct RoomHandle {
    game_id: GameId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the game this room serves.
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Attaches a connection and returns the position it should render.
    ///
    /// The same position is also pushed as an update frame on `sender`,
    /// so a client needs no separate "fetch state" request.
    pub async fn connect(
        &self,
        channel: ChannelId,
        sender: FrameSender,
    ) -> Result<String, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Connect {
                channel,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))
    }

    /// Submits a move (fire-and-forget).
    pub async fn submit_move(
        &self,
        channel: ChannelId,
        mv: MoveDescriptor,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::SubmitMove { channel, mv })
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))
    }

    /// Requests a reset to the starting position (fire-and-forget).
    pub async fn reset(&self, channel: ChannelId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Reset { channel })
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))
    }

    /// Mints a video join credential for one participant.
    pub async fn video_credential(
        &self,
        display_name: String,
    ) -> Result<VideoGrant, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::VideoCredential {
                display_name,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))?
    }

    /// Detaches a connection.
    pub async fn disconnect(
        &self,
        channel: ChannelId,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect { channel })
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    game_id: GameId,
    /// Canonical position. `None` until the first connection arrives.
    fen: Option<String>,
    video_session_id: Option<String>,
    /// Per-connection outbound channels.
    connections: HashMap<ChannelId, FrameSender>,
    deps: RoomDeps,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until all handles drop.
    async fn run(mut self) {
        tracing::info!(game_id = %self.game_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Connect {
                    channel,
                    sender,
                    reply,
                } => {
                    let fen = self.handle_connect(channel, sender).await;
                    let _ = reply.send(fen);
                }
                RoomCommand::SubmitMove { channel, mv } => {
                    self.handle_move(channel, mv).await;
                }
                RoomCommand::Reset { channel } => {
                    self.handle_reset(channel).await;
                }
                RoomCommand::VideoCredential {
                    display_name,
                    reply,
                } => {
                    let result = self.handle_video(display_name).await;
                    let _ = reply.send(result);
                }
                RoomCommand::Disconnect { channel } => {
                    self.handle_disconnect(channel);
                }
            }
        }

        tracing::info!(game_id = %self.game_id, "room actor stopped");
    }

    async fn handle_connect(
        &mut self,
        channel: ChannelId,
        sender: FrameSender,
    ) -> String {
        let fen = match &self.fen {
            Some(fen) => fen.clone(),
            None => {
                // First connection ever for this game: materialize the
                // starting position and persist it before anyone sees it.
                let fen = STARTING_FEN.to_string();
                if let Err(error) = self.persist(Some(fen.clone())).await {
                    tracing::error!(
                        game_id = %self.game_id,
                        %error,
                        "failed to persist initial position"
                    );
                }
                self.fen = Some(fen.clone());
                fen
            }
        };

        // Push the snapshot so the client renders without asking.
        let _ = sender.send(ServerFrame::Update {
            fen: fen.clone(),
            last_move: None,
        });
        self.connections.insert(channel, sender);
        tracing::info!(
            game_id = %self.game_id,
            %channel,
            connections = self.connections.len(),
            "channel connected"
        );
        fen
    }

    async fn handle_move(&mut self, channel: ChannelId, mv: MoveDescriptor) {
        let Some(current) = self.fen.clone() else {
            self.send_to(
                channel,
                ServerFrame::Rejected {
                    reason: "no position yet".to_string(),
                },
            );
            return;
        };

        let next = match gambit_rules::apply(&current, &mv) {
            Ok(next) => next,
            Err(error) => {
                tracing::debug!(
                    game_id = %self.game_id,
                    %channel,
                    %error,
                    "move rejected"
                );
                // Only the mover hears about it; peers stay silent.
                self.send_to(
                    channel,
                    ServerFrame::Rejected {
                        reason: error.to_string(),
                    },
                );
                return;
            }
        };

        // Persist first. If the write fails the in-memory position is
        // left untouched and no update frame goes out.
        if let Err(error) = self.persist(Some(next.clone())).await {
            tracing::error!(
                game_id = %self.game_id,
                %channel,
                %error,
                "failed to persist move"
            );
            self.send_to(
                channel,
                ServerFrame::Rejected {
                    reason: "storage failure".to_string(),
                },
            );
            return;
        }

        self.fen = Some(next.clone());
        tracing::info!(game_id = %self.game_id, %channel, "move applied");
        self.broadcast(ServerFrame::Update {
            fen: next,
            last_move: Some(mv),
        });
    }

    async fn handle_reset(&mut self, channel: ChannelId) {
        let fen = STARTING_FEN.to_string();

        if let Err(error) = self.persist(Some(fen.clone())).await {
            tracing::error!(
                game_id = %self.game_id,
                %channel,
                %error,
                "failed to persist reset"
            );
            self.send_to(
                channel,
                ServerFrame::Rejected {
                    reason: "storage failure".to_string(),
                },
            );
            return;
        }

        self.fen = Some(fen.clone());
        tracing::info!(game_id = %self.game_id, %channel, "game reset");
        self.broadcast(ServerFrame::Update {
            fen,
            last_move: None,
        });
    }

    async fn handle_video(
        &mut self,
        display_name: String,
    ) -> Result<VideoGrant, RoomError> {
        let session_id = match &self.video_session_id {
            Some(id) => id.clone(),
            None => {
                let title = format!("chess-{}", self.game_id);
                let id = self.deps.media.create_session(&title, true).await?;
                self.video_session_id = Some(id.clone());
                // The id is cached before the credential call so a later
                // request reuses it even if this persist fails.
                if let Err(error) = self.persist(self.fen.clone()).await {
                    tracing::error!(
                        game_id = %self.game_id,
                        %error,
                        "failed to persist video session id"
                    );
                }
                tracing::info!(
                    game_id = %self.game_id,
                    session_id = %id,
                    "video session created"
                );
                id
            }
        };

        // Each grant gets its own participant identity at the vendor,
        // even when two players pick the same display name.
        let instance_id = uuid::Uuid::new_v4().to_string();
        let token = self
            .deps
            .media
            .issue_join_credential(
                &session_id,
                &display_name,
                &self.deps.video_preset,
                &instance_id,
            )
            .await?;

        Ok(VideoGrant {
            auth_token: token,
            meeting_id: session_id,
        })
    }

    fn handle_disconnect(&mut self, channel: ChannelId) {
        if self.connections.remove(&channel).is_some() {
            tracing::info!(
                game_id = %self.game_id,
                %channel,
                connections = self.connections.len(),
                "channel disconnected"
            );
        }
    }

    /// Writes the game record with the given position and the current
    /// video session id. Callers commit in-memory state only afterwards.
    async fn persist(&self, fen: Option<String>) -> Result<(), RoomError> {
        let record = GameRecord {
            fen,
            video_session_id: self.video_session_id.clone(),
        };
        let value = serde_json::to_string(&record)?;
        self.deps
            .store
            .put(&record_key(&self.game_id), &value)
            .await?;
        Ok(())
    }

    /// Sends a frame to every attached connection. Dead channels are
    /// dropped silently; the socket layer cleans them up on disconnect.
    fn broadcast(&self, frame: ServerFrame) {
        for sender in self.connections.values() {
            let _ = sender.send(frame.clone());
        }
    }

    /// Sends a frame to a single connection, if it is still attached.
    fn send_to(&self, channel: ChannelId, frame: ServerFrame) {
        if let Some(sender) = self.connections.get(&channel) {
            let _ = sender.send(frame);
        }
    }
}

/// Spawns a room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure — if the channel fills up,
/// senders will wait (bounded channel).
pub(crate) fn spawn_room(
    game_id: GameId,
    record: Option<GameRecord>,
    deps: RoomDeps,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let (fen, video_session_id) = match record {
        Some(record) => (record.fen, record.video_session_id),
        None => (None, None),
    };

    let actor = RoomActor {
        game_id: game_id.clone(),
        fen,
        video_session_id,
        connections: HashMap::new(),
        deps,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        game_id,
        sender: tx,
    }
}
