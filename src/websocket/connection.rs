//! The WebSocket connection handler: one logical task pair (a receive loop
//! driving dispatch, and a send task draining the outbound `mpsc` channel)
//! per client, mirroring the teacher's `handle_socket` split.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::metrics::ServerMetrics;
use crate::protocol::{validate_player_name, validate_room_id, ClientMessage, PlayerId, RoomId, ServerMessage};
use crate::room::{Room, RoomError};

use super::state::AppState;

/// Per-connection book-keeping threaded through [`dispatch`]. A connection
/// occupies at most one room for its lifetime: the wire protocol has no
/// "leave room" message, and a dropped socket is always treated as a leave
/// (see spec Non-goals: no reconnection).
struct ConnectionState {
    player_id: Option<PlayerId>,
    room: Option<Arc<Room>>,
    sender: mpsc::Sender<Arc<ServerMessage>>,
}

impl ConnectionState {
    fn unicast(&self, message: ServerMessage) {
        let _ = self.sender.try_send(Arc::new(message));
    }
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<ServerMessage>>(32);

    ServerMetrics::inc(&state.metrics.total_connections);
    ServerMetrics::inc(&state.metrics.active_connections);

    let send_timeout = Duration::from_secs(state.config.server.send_timeout_secs);
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let payload = match serde_json::to_string(message.as_ref()) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize outbound message");
                    continue;
                }
            };
            let write = ws_sender.send(Message::Text(payload.into()));
            match tokio::time::timeout(send_timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(%addr, error = %err, "websocket write failed, closing");
                    break;
                }
                Err(_) => {
                    tracing::debug!(%addr, "websocket write timed out, treating as disconnect");
                    break;
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut conn = ConnectionState {
        player_id: None,
        room: None,
        sender: tx,
    };

    while let Some(frame) = ws_receiver.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(%addr, error = %err, "websocket read error, closing");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                if text.len() > state.config.security.max_message_size {
                    tracing::debug!(%addr, size = text.len(), "dropping oversized frame");
                    continue;
                }
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_message) => dispatch(&state, &mut conn, client_message).await,
                    Err(err) => {
                        // Malformed envelope or unknown `type`: dropped silently
                        // per the error taxonomy, never a connection-ending error.
                        ServerMetrics::inc(&state.metrics.malformed_frames_dropped);
                        tracing::debug!(%addr, error = %err, "dropping malformed or unknown frame");
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    cleanup(&state, &conn).await;
    send_task.abort();
    ServerMetrics::dec(&state.metrics.active_connections);
}

async fn cleanup(state: &Arc<AppState>, conn: &ConnectionState) {
    let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) else {
        return;
    };
    if room.remove_player(player_id).await {
        state.registry.remove(&room.id);
    }
}

async fn dispatch(state: &Arc<AppState>, conn: &mut ConnectionState, message: ClientMessage) {
    match message {
        ClientMessage::CreateRoom {
            player_name,
            player_id,
        } => handle_create_room(state, conn, player_id, player_name).await,
        ClientMessage::JoinRoom {
            room_id,
            player_name,
            player_id,
        } => handle_join_room(state, conn, room_id, player_id, player_name).await,
        ClientMessage::ToggleReady {} => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.toggle_ready(player_id).await;
            }
        }
        ClientMessage::StartGame {} => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.start_game(player_id).await;
            }
        }
        ClientMessage::RestartGame {} => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.restart_game(player_id).await;
            }
        }
        ClientMessage::ClientReady {} => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.handle_client_ready(player_id).await;
            }
        }
        ClientMessage::Buzz { card_id } => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.handle_buzz(player_id, &card_id).await;
            }
        }
        ClientMessage::NoSong {} => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.handle_no_song(player_id).await;
            }
        }
        ClientMessage::Chat { text } => {
            if let (Some(room), Some(player_id)) = (&conn.room, &conn.player_id) {
                room.chat(player_id, text).await;
            }
        }
        ClientMessage::Ping {} => {}
    }
}

/// `create_room` is a no-op if this connection already occupies a room; the
/// protocol has no mechanism to leave and create another.
async fn handle_create_room(
    state: &Arc<AppState>,
    conn: &mut ConnectionState,
    player_id: PlayerId,
    player_name: String,
) {
    if conn.room.is_some() {
        return;
    }
    if let Err(message) = validate_player_name(&player_name, &state.config.protocol) {
        conn.unicast(ServerMessage::Error { message });
        return;
    }

    match state
        .registry
        .create_room(player_id.clone(), player_name, conn.sender.clone())
    {
        Ok(room) => {
            let room_id = room.id.clone();
            conn.player_id = Some(player_id);
            conn.room = Some(room);
            conn.unicast(ServerMessage::RoomCreated { room_id });
        }
        Err(RoomError::RegistryFull) => {
            conn.unicast(ServerMessage::Error {
                message: "no rooms available".to_string(),
            });
        }
        Err(_) => unreachable!("create_room only returns RegistryFull"),
    }
}

async fn handle_join_room(
    state: &Arc<AppState>,
    conn: &mut ConnectionState,
    room_id: RoomId,
    player_id: PlayerId,
    player_name: String,
) {
    if conn.room.is_some() {
        return;
    }
    if let Err(message) = validate_room_id(&room_id, &state.config.protocol) {
        conn.unicast(ServerMessage::Error { message });
        return;
    }
    if let Err(message) = validate_player_name(&player_name, &state.config.protocol) {
        conn.unicast(ServerMessage::Error { message });
        return;
    }

    let Some(room) = state.registry.get(&room_id) else {
        ServerMetrics::inc(&state.metrics.room_join_failures);
        conn.unicast(ServerMessage::Error {
            message: "room not found".to_string(),
        });
        return;
    };

    match room
        .join(player_id.clone(), player_name, conn.sender.clone())
        .await
    {
        Ok(()) => {
            conn.player_id = Some(player_id);
            conn.room = Some(room);
        }
        Err(err) => {
            ServerMetrics::inc(&state.metrics.room_join_failures);
            let message = match err {
                RoomError::RoomFull => "room full",
                RoomError::NameTaken => "name taken",
                RoomError::NotFound => "room not found",
                RoomError::RegistryFull => "no rooms available",
            };
            conn.unicast(ServerMessage::Error {
                message: message.to_string(),
            });
        }
    }
}
