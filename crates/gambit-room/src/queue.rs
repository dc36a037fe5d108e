//! Matching queue: pairs anonymous players two at a time.
//!
//! The queue is a single-slot actor. An empty slot parks the caller as
//! the waiting player; an occupied slot pairs the caller with whoever
//! is parked. The waiting player holds no connection to push to, so
//! their side of the pairing is parked in a ready map and handed out
//! when they poll again with the same player ID.

use std::collections::HashMap;
use std::sync::Arc;

use gambit_protocol::{GameId, PlayerId, Side};
use gambit_store::Store;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::QueueError;

/// Store key for the waiting slot.
const SLOT_KEY: &str = "queue/waiting";

/// Command channel size for the queue actor.
const CHANNEL_SIZE: usize = 64;

/// The durable record of the one waiting player.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotRecord {
    player_id: PlayerId,
    /// Game ID reserved when the player started waiting, echoed on
    /// every retry so their client keys on a stable value.
    provisional_game_id: GameId,
}

/// A pairing parked for the waiting player to collect.
struct ParkedPairing {
    game_id: GameId,
    peer_id: PlayerId,
}

/// Outcome of one join call.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// The caller is parked in the slot; they should poll again.
    Waiting {
        player_id: PlayerId,
        provisional_game_id: GameId,
    },
    /// The caller has a game and an opponent.
    Matched {
        player_id: PlayerId,
        game_id: GameId,
        side: Side,
        peer_id: PlayerId,
    },
}

enum QueueCommand {
    Join {
        player_id: Option<PlayerId>,
        reply: oneshot::Sender<JoinOutcome>,
    },
}

/// Handle to the running queue actor. Cheap to clone.
#[derive(Clone)]
pub struct QueueHandle {
    sender: mpsc::Sender<QueueCommand>,
}

impl QueueHandle {
    /// Spawns the queue actor and returns a handle to it.
    ///
    /// The slot is reloaded from the store, so a player left waiting
    /// across a restart is still first in line.
    pub fn spawn(store: Arc<dyn Store>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let actor = QueueActor {
            slot: None,
            ready: HashMap::new(),
            store,
            receiver: rx,
        };
        tokio::spawn(actor.run());
        Self { sender: tx }
    }

    /// Joins the queue, minting a player ID when the caller has none.
    pub async fn join(
        &self,
        player_id: Option<PlayerId>,
    ) -> Result<JoinOutcome, QueueError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(QueueCommand::Join {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| QueueError::Unavailable)?;
        reply_rx.await.map_err(|_| QueueError::Unavailable)
    }
}

/// The internal queue actor state. Runs inside a Tokio task.
struct QueueActor {
    slot: Option<SlotRecord>,
    /// Pairings waiting to be collected by their first player,
    /// keyed by that player's ID. Delivered exactly once.
    ready: HashMap<PlayerId, ParkedPairing>,
    store: Arc<dyn Store>,
    receiver: mpsc::Receiver<QueueCommand>,
}

impl QueueActor {
    async fn run(mut self) {
        self.restore().await;
        tracing::info!("matching queue started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                QueueCommand::Join { player_id, reply } => {
                    let outcome = self.handle_join(player_id).await;
                    let _ = reply.send(outcome);
                }
            }
        }

        tracing::info!("matching queue stopped");
    }

    /// Reloads the waiting slot from the store, if one was persisted.
    async fn restore(&mut self) {
        match self.store.get(SLOT_KEY).await {
            Ok(Some(value)) => match serde_json::from_str(&value) {
                Ok(record) => {
                    self.slot = Some(record);
                    tracing::info!("waiting slot restored from store");
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable slot record");
                }
            },
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%error, "failed to read slot record");
            }
        }
    }

    async fn handle_join(
        &mut self,
        player_id: Option<PlayerId>,
    ) -> JoinOutcome {
        let player_id = player_id.unwrap_or_else(PlayerId::new);

        // A parked pairing trumps everything: this is the waiting
        // player coming back to collect their match.
        if let Some(pairing) = self.ready.remove(&player_id) {
            tracing::info!(
                %player_id,
                game_id = %pairing.game_id,
                "pairing delivered to waiting player"
            );
            return JoinOutcome::Matched {
                player_id,
                game_id: pairing.game_id,
                side: Side::First,
                peer_id: pairing.peer_id,
            };
        }

        match self.slot.take() {
            // Empty queue: park the caller.
            None => {
                let record = SlotRecord {
                    player_id: player_id.clone(),
                    provisional_game_id: GameId::new(),
                };
                self.persist_slot(Some(&record)).await;
                tracing::info!(%player_id, "player waiting");
                let outcome = JoinOutcome::Waiting {
                    player_id,
                    provisional_game_id: record.provisional_game_id.clone(),
                };
                self.slot = Some(record);
                outcome
            }

            // The waiting player retried; keep them parked.
            Some(record) if record.player_id == player_id => {
                let outcome = JoinOutcome::Waiting {
                    player_id,
                    provisional_game_id: record.provisional_game_id.clone(),
                };
                self.slot = Some(record);
                outcome
            }

            // A second player: pair the two and clear the slot.
            Some(record) => {
                self.persist_slot(None).await;
                let game_id = GameId::new();
                tracing::info!(
                    %game_id,
                    first = %record.player_id,
                    second = %player_id,
                    "players paired"
                );
                self.ready.insert(
                    record.player_id.clone(),
                    ParkedPairing {
                        game_id: game_id.clone(),
                        peer_id: player_id.clone(),
                    },
                );
                JoinOutcome::Matched {
                    player_id,
                    game_id,
                    side: Side::Second,
                    peer_id: record.player_id,
                }
            }
        }
    }

    /// Persists or clears the slot record. Store failures are logged
    /// and the in-memory slot stays authoritative for this process.
    async fn persist_slot(&self, record: Option<&SlotRecord>) {
        let result = match record {
            Some(record) => match serde_json::to_string(record) {
                Ok(value) => self.store.put(SLOT_KEY, &value).await,
                Err(error) => {
                    tracing::error!(%error, "failed to encode slot record");
                    return;
                }
            },
            None => self.store.delete(SLOT_KEY).await,
        };
        if let Err(error) = result {
            tracing::error!(%error, "failed to persist slot record");
        }
    }
}
