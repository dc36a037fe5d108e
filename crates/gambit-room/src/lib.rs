//! Coordination core: room actors and the matching queue.
//!
//! A room is a Tokio task owning one game's canonical position; the
//! matching queue is another task pairing anonymous players two at a
//! time. Both follow the same shape: a private actor struct driving an
//! mpsc command loop, and a cheap-to-clone public handle.
//!
//! Two invariants live here and nowhere else:
//! - a position update is broadcast only after its durable write
//!   succeeded, so a restart can never rewind what clients saw;
//! - a game gets at most one video session, because the only writer of
//!   the session id is the room's own command loop.

mod error;
mod manager;
mod queue;
mod room;

pub use error::{QueueError, RoomError};
pub use manager::RoomManager;
pub use queue::{JoinOutcome, QueueHandle};
pub use room::{ChannelId, FrameSender, RoomHandle, VideoGrant};
