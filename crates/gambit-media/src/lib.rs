//! External media session service for gambit.
//!
//! Video chat itself is delegated to a third-party real-time media vendor.
//! The coordination core only needs two operations from it: create a
//! meeting once per game, and mint a per-participant single-use join
//! credential for that meeting. Both are network-bound, fallible, and
//! possibly slow — the [`MediaService`] trait keeps that behind a seam so
//! rooms can be tested without a network.

mod error;
mod http;
mod stub;

pub use error::MediaError;
pub use http::{HttpMediaService, MediaConfig};
pub use stub::StubMediaService;

use async_trait::async_trait;

/// The media vendor contract.
///
/// Failures are reported to the single requesting caller and never affect
/// game state; the room layer enforces that.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Creates a new meeting and returns its session id.
    async fn create_session(
        &self,
        title: &str,
        waiting_room_disabled: bool,
    ) -> Result<String, MediaError>;

    /// Issues a single-use join credential for one participant of an
    /// existing session. Credentials are never shared across callers.
    async fn issue_join_credential(
        &self,
        session_id: &str,
        display_name: &str,
        preset_name: &str,
        client_instance_id: &str,
    ) -> Result<String, MediaError>;
}
