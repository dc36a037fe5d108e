//! Error types for the coordination core.

use gambit_media::MediaError;
use gambit_protocol::GameId;
use gambit_store::StoreError;

/// Errors surfaced by room handles and the room actor.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's actor task is gone, or its command channel is full
    /// beyond recovery. Callers should treat the game as over.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),

    /// The game record could not be encoded or decoded.
    #[error("bad game record: {0}")]
    Record(#[from] serde_json::Error),

    /// The durable store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The media vendor rejected a session or credential request.
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Errors surfaced by the matching queue handle.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue's actor task is gone.
    #[error("matching queue is unavailable")]
    Unavailable,
}
