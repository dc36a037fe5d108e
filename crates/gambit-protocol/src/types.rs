//! Core protocol types for gambit's wire format.
//!
//! Everything here is a structure that gets serialized to JSON, crosses the
//! network, and is deserialized on the other side — either as a WebSocket
//! frame or as an HTTP body. The exact shapes matter: the browser client is
//! written against them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for one game, assigned when the matching queue mints a
/// pairing and never changed afterwards. It is the sole key used to route
/// requests to the owning room.
///
/// `#[serde(transparent)]` makes `GameId("abc")` serialize as just `"abc"`,
/// which is what the client expects in `gameId` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Mints a fresh globally-unique game id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier for one anonymous participant.
///
/// Generated server-side when a client joins the queue without presenting
/// one; echoed back so the client can use it for idempotent retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Mints a fresh opaque player id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which seat a queue pairing assigned to a caller.
///
/// Symmetric but distinguishable: the first arrival waits, the second
/// arrival completes the pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

// ---------------------------------------------------------------------------
// Move descriptor
// ---------------------------------------------------------------------------

/// A proposed move: origin square, destination square, and an optional
/// promotion piece (`"q"`, `"r"`, `"b"`, or `"n"`).
///
/// The squares are algebraic names (`"e2"`). Whether the move is legal —
/// or even parseable — is the rules layer's business, not the protocol's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// ---------------------------------------------------------------------------
// WebSocket frames
// ---------------------------------------------------------------------------

/// Inbound frames a client may send over a game channel.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{"type": "move", "move": {...}}` and `{"type": "reset"}`.
/// This is a closed sum type — a frame with an unknown tag fails to
/// deserialize rather than being silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Submit a move against the current position.
    Move {
        #[serde(rename = "move")]
        mv: MoveDescriptor,
    },
    /// Restore the starting position. Either participant may send this.
    Reset,
}

impl ClientFrame {
    /// Decodes a frame from the text payload of a WebSocket message.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

/// Outbound frames the server sends over a game channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// The canonical position changed (validated move, reset, or the
    /// snapshot pushed at connect time). Broadcast to every channel.
    Update {
        fen: String,
        #[serde(
            rename = "lastMove",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        last_move: Option<MoveDescriptor>,
    },
    /// A submission was refused. Sent to the submitting channel only —
    /// a rejected move is never broadcast.
    Rejected { reason: String },
}

impl ServerFrame {
    /// Encodes a frame into the text payload of a WebSocket message.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

// ---------------------------------------------------------------------------
// Queue endpoint payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/queue/join`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJoinRequest {
    /// Absent on a first call; present on idempotent retries and on the
    /// polling calls a waiting player makes to learn its pairing.
    #[serde(default)]
    pub player_id: Option<PlayerId>,
}

/// Queue outcome reported by `POST /api/queue/join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Waiting,
    Matched,
}

/// Response of `POST /api/queue/join`.
///
/// While `status` is `waiting`, `game_id` is provisional and never routes;
/// the id both sides actually share is minted by the pairing event and
/// delivered to the waiting side on its next poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJoinResponse {
    pub status: QueueStatus,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub assigned_side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// Video credential payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/game/{game_id}/video-token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenRequest {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Successful response of the video-token endpoint: a single-use join
/// credential scoped to the game's shared media session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenResponse {
    pub auth_token: String,
    pub app_id: String,
    pub meeting_id: String,
}

// =========================================================================
// Tests
// =========================================================================
