//! Integration tests for the matching queue.

use std::sync::Arc;

use gambit_protocol::{PlayerId, Side};
use gambit_room::{JoinOutcome, QueueHandle};
use gambit_store::{MemoryStore, Store};

fn new_queue() -> QueueHandle {
    QueueHandle::spawn(Arc::new(MemoryStore::new()) as Arc<dyn Store>)
}

#[tokio::test]
async fn test_first_join_waits() {
    let queue = new_queue();

    match queue.join(None).await.unwrap() {
        JoinOutcome::Waiting {
            player_id,
            provisional_game_id,
        } => {
            assert!(!player_id.0.is_empty(), "a player id is minted");
            assert!(!provisional_game_id.0.is_empty());
        }
        other => panic!("expected waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_join_matches_with_waiting_player() {
    let queue = new_queue();

    let JoinOutcome::Waiting {
        player_id: first,
        provisional_game_id,
    } = queue.join(None).await.unwrap()
    else {
        panic!("first caller must wait");
    };

    match queue.join(None).await.unwrap() {
        JoinOutcome::Matched {
            player_id,
            game_id,
            side,
            peer_id,
        } => {
            assert_ne!(player_id, first);
            assert_eq!(side, Side::Second);
            assert_eq!(peer_id, first);
            // The real game id is minted at pairing time, not the
            // placeholder the waiting player was shown.
            assert_ne!(game_id, provisional_game_id);
        }
        other => panic!("expected matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_waiting_player_collects_pairing_on_next_poll() {
    let queue = new_queue();

    let JoinOutcome::Waiting { player_id: first, .. } =
        queue.join(None).await.unwrap()
    else {
        panic!("first caller must wait");
    };
    let JoinOutcome::Matched {
        player_id: second,
        game_id,
        ..
    } = queue.join(None).await.unwrap()
    else {
        panic!("second caller must match");
    };

    // The waiting player polls with its own id and learns the pairing.
    match queue.join(Some(first.clone())).await.unwrap() {
        JoinOutcome::Matched {
            player_id,
            game_id: delivered,
            side,
            peer_id,
        } => {
            assert_eq!(player_id, first);
            assert_eq!(delivered, game_id, "both sides share one game id");
            assert_eq!(side, Side::First);
            assert_eq!(peer_id, second);
        }
        other => panic!("expected matched, got {other:?}"),
    }

    // Delivered exactly once: the next poll re-enters the queue.
    match queue.join(Some(first)).await.unwrap() {
        JoinOutcome::Waiting { .. } => {}
        other => panic!("expected waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_waiting_retry_is_idempotent() {
    let queue = new_queue();

    let JoinOutcome::Waiting {
        player_id,
        provisional_game_id,
    } = queue.join(None).await.unwrap()
    else {
        panic!("first caller must wait");
    };

    // Retrying with the same id never pairs a player against itself.
    match queue.join(Some(player_id.clone())).await.unwrap() {
        JoinOutcome::Waiting {
            player_id: retried,
            provisional_game_id: again,
        } => {
            assert_eq!(retried, player_id);
            assert_eq!(again, provisional_game_id, "placeholder is stable");
        }
        other => panic!("expected waiting, got {other:?}"),
    }

    // The slot still holds exactly one player.
    match queue.join(None).await.unwrap() {
        JoinOutcome::Matched { peer_id, .. } => assert_eq!(peer_id, player_id),
        other => panic!("expected matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pairing_empties_the_slot() {
    let queue = new_queue();

    queue.join(None).await.unwrap();
    queue.join(None).await.unwrap();

    // A third caller starts a fresh cycle.
    match queue.join(None).await.unwrap() {
        JoinOutcome::Waiting { .. } => {}
        other => panic!("expected waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_caller_keeps_presented_player_id() {
    let queue = new_queue();
    let id = PlayerId("returning-player".into());

    match queue.join(Some(id.clone())).await.unwrap() {
        JoinOutcome::Waiting { player_id, .. } => assert_eq!(player_id, id),
        other => panic!("expected waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_waiting_slot_survives_restart() {
    let store = Arc::new(MemoryStore::new());

    let first = {
        let queue = QueueHandle::spawn(store.clone() as Arc<dyn Store>);
        let JoinOutcome::Waiting { player_id, .. } =
            queue.join(None).await.unwrap()
        else {
            panic!("first caller must wait");
        };
        player_id
    };

    // A fresh queue over the same store stands in for a restarted
    // process: the parked player is still first in line.
    let queue = QueueHandle::spawn(store as Arc<dyn Store>);
    match queue.join(None).await.unwrap() {
        JoinOutcome::Matched { peer_id, side, .. } => {
            assert_eq!(peer_id, first);
            assert_eq!(side, Side::Second);
        }
        other => panic!("expected matched, got {other:?}"),
    }
}
