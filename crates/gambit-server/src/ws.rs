//! Per-connection WebSocket loop.
//!
//! Each upgraded socket gets its own task running [`drive`]. The task
//! owns one [`ChannelId`] and pumps two directions: frames from the
//! room's outbound channel onto the socket, and client frames off the
//! socket into room commands. Exiting for any reason detaches the
//! channel from the room.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use gambit_protocol::{ClientFrame, ServerFrame};
use gambit_room::{ChannelId, RoomHandle};
use tokio::sync::mpsc;

pub(crate) async fn drive(socket: WebSocket, room: RoomHandle) {
    let channel = ChannelId::next();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // The connect reply carries the position, but the room also pushes
    // it as the first frame on `tx`, so only the frame path is used.
    if let Err(error) = room.connect(channel, tx).await {
        tracing::warn!(
            game_id = %room.game_id(),
            %channel,
            %error,
            "room refused connection"
        );
        return;
    }

    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::error!(%channel, %error, "unencodable frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientFrame::decode(&text) {
                            Ok(ClientFrame::Move { mv }) => {
                                if room.submit_move(channel, mv).await.is_err() {
                                    break;
                                }
                            }
                            Ok(ClientFrame::Reset) => {
                                if room.reset(channel).await.is_err() {
                                    break;
                                }
                            }
                            Err(error) => {
                                // An unreadable frame is the sender's
                                // problem alone; the room never sees it.
                                tracing::debug!(
                                    %channel,
                                    %error,
                                    "unreadable client frame"
                                );
                                let rejection = ServerFrame::Rejected {
                                    reason: format!("unreadable frame: {error}"),
                                };
                                if let Ok(text) = rejection.encode() {
                                    let _ = sink.send(Message::Text(text)).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Pings are answered by axum; other frames carry
                    // nothing for us.
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::debug!(%channel, %error, "socket error");
                        break;
                    }
                }
            }
        }
    }

    let _ = room.disconnect(channel).await;
    tracing::debug!(game_id = %room.game_id(), %channel, "socket closed");
}
