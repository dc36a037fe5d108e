//! Wire protocol for gambit.
//!
//! This crate defines the "language" that browser clients and the server
//! speak:
//!
//! - **Identifiers** ([`GameId`], [`PlayerId`]) — opaque routing keys.
//! - **Frames** ([`ClientFrame`], [`ServerFrame`]) — the tagged JSON
//!   messages that travel over a game's WebSocket channel.
//! - **HTTP payloads** ([`QueueJoinRequest`], [`QueueJoinResponse`],
//!   [`VideoTokenRequest`], [`VideoTokenResponse`]) — the bodies of the
//!   queue and video-credential endpoints.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer knows nothing about rooms, sockets, or chess rules —
//! it only pins down the JSON shapes both sides must agree on.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    ClientFrame, GameId, MoveDescriptor, PlayerId, QueueJoinRequest,
    QueueJoinResponse, QueueStatus, ServerFrame, Side, VideoTokenRequest,
    VideoTokenResponse,
};
