//! Deterministic [`MediaService`] double for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{MediaError, MediaService};

/// In-process media service that mints predictable ids and counts calls.
///
/// `created_sessions()` lets tests assert the check-then-create guarantee:
/// however many callers race on a room's first video request, exactly one
/// session must be created.
#[derive(Default)]
pub struct StubMediaService {
    created: AtomicUsize,
    fail: bool,
}

impl StubMediaService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub whose every call fails, for error-path tests.
    pub fn failing() -> Self {
        Self {
            created: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of sessions created so far.
    pub fn created_sessions(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaService for StubMediaService {
    async fn create_session(
        &self,
        _title: &str,
        _waiting_room_disabled: bool,
    ) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Api {
                status: 503,
                message: "stub unavailable".into(),
            });
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("session-{n}"))
    }

    async fn issue_join_credential(
        &self,
        session_id: &str,
        display_name: &str,
        _preset_name: &str,
        _client_instance_id: &str,
    ) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Api {
                status: 503,
                message: "stub unavailable".into(),
            });
        }
        Ok(format!("token-{session_id}-{display_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_counts_created_sessions() {
        let stub = StubMediaService::new();
        assert_eq!(stub.created_sessions(), 0);

        let first = stub.create_session("t", true).await.unwrap();
        let second = stub.create_session("t", true).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(stub.created_sessions(), 2);
    }

    #[tokio::test]
    async fn test_failing_stub_reports_api_error() {
        let stub = StubMediaService::failing();
        let result = stub.create_session("t", true).await;
        assert!(matches!(result, Err(MediaError::Api { status: 503, .. })));
    }
}
