use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    models::chatmodels::SenderRole,
    service::realtime::RoomChannels,
    AppState,
};

/// Events a connection may send over the socket channel.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: Uuid },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: Uuid,
        sender: SenderRole,
        message: String,
    },
}

/// Events the server pushes back.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage { sender: SenderRole, message: String },
    ErrorMessage { message: String },
}

/// One forwarder task per room this connection has joined. Keyed by room id
/// so a repeated join_room is a no-op instead of a second delivery stream.
#[derive(Debug, Default)]
struct RoomSubscriptions {
    tasks: HashMap<Uuid, JoinHandle<()>>,
}

impl RoomSubscriptions {
    /// Subscribes to the room and spawns its forwarder unless this
    /// connection is already in the room. Returns whether a new
    /// subscription was made.
    async fn join(
        &mut self,
        rooms: &RoomChannels,
        room_id: Uuid,
        out: mpsc::Sender<ServerEvent>,
    ) -> bool {
        if self.tasks.contains_key(&room_id) {
            return false;
        }

        let mut rx = rooms.subscribe(room_id).await;
        self.tasks.insert(
            room_id,
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(room_event) => {
                            let event = ServerEvent::ReceiveMessage {
                                sender: room_event.sender,
                                message: room_event.message,
                            };
                            if out.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "Socket lagged behind room {}: {} events dropped",
                                room_id,
                                skipped
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }),
        );
        true
    }

    /// Aborts every forwarder and waits for each to finish, so the
    /// broadcast receivers are dropped before the caller continues.
    async fn shutdown(self) {
        for (_, task) in self.tasks {
            task.abort();
            let _ = task.await;
        }
    }
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Extension(app_state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    tracing::debug!("Socket client connected");

    let (mut sink, mut stream) = socket.split();

    // Single writer task; room forwarders and the event loop feed it.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(32);
    let write_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let Ok(frame) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut subscriptions = RoomSubscriptions::default();

    while let Some(Ok(frame)) = stream.next().await {
        let Message::Text(text) = frame else {
            continue;
        };

        let event = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Ignoring malformed socket frame: {}", e);
                continue;
            }
        };

        match event {
            ClientEvent::JoinRoom { room_id } => {
                // No membership check at join time; any connection may
                // subscribe to any room group by id.
                if subscriptions
                    .join(&app_state.rooms, room_id, out_tx.clone())
                    .await
                {
                    tracing::debug!("Socket client joined room {}", room_id);
                } else {
                    tracing::debug!("Socket client already in room {}", room_id);
                }
            }
            ClientEvent::SendMessage {
                room_id,
                sender,
                message,
            } => {
                // Same primitive as the REST path: persist, then fan out.
                if let Err(e) = app_state
                    .chat_service
                    .send_message(room_id, sender, message)
                    .await
                {
                    tracing::error!("Socket message to room {} failed: {}", room_id, e);
                    let _ = out_tx
                        .send(ServerEvent::ErrorMessage {
                            message: "Server error".to_string(),
                        })
                        .await;
                }
            }
        }
    }

    // Connection gone; all room subscriptions go with it, and channels
    // left without any subscriber are dropped from the registry.
    subscriptions.shutdown().await;
    app_state.rooms.sweep().await;
    write_task.abort();
    tracing::debug!("Socket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room_frame() {
        let room_id = Uuid::new_v4();
        let frame = format!(r#"{{"event":"join_room","data":{{"roomId":"{}"}}}}"#, room_id);
        let event = serde_json::from_str::<ClientEvent>(&frame).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom { room_id });
    }

    #[test]
    fn test_send_message_frame() {
        let room_id = Uuid::new_v4();
        let frame = format!(
            r#"{{"event":"send_message","data":{{"roomId":"{}","sender":"client","message":"내일 뵙겠습니다"}}}}"#,
            room_id
        );
        let event = serde_json::from_str::<ClientEvent>(&frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                room_id,
                sender: SenderRole::Client,
                message: "내일 뵙겠습니다".to_string(),
            }
        );
    }

    #[test]
    fn test_legacy_user_sender_accepted() {
        let room_id = Uuid::new_v4();
        let frame = format!(
            r#"{{"event":"send_message","data":{{"roomId":"{}","sender":"user","message":"hi"}}}}"#,
            room_id
        );
        let event = serde_json::from_str::<ClientEvent>(&frame).unwrap();
        match event {
            ClientEvent::SendMessage { sender, .. } => assert_eq!(sender, SenderRole::Worker),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_receive_message_frame_shape() {
        let event = ServerEvent::ReceiveMessage {
            sender: SenderRole::Worker,
            message: "hello".to_string(),
        };
        let frame = serde_json::to_value(&event).unwrap();
        assert_eq!(
            frame,
            serde_json::json!({
                "event": "receive_message",
                "data": { "sender": "worker", "message": "hello" }
            })
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        let frame = r#"{"event":"leave_room","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[tokio::test]
    async fn test_rejoin_same_room_delivers_once() {
        use crate::service::realtime::RoomEvent;

        let rooms = RoomChannels::new();
        let room_id = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let mut subscriptions = RoomSubscriptions::default();

        assert!(subscriptions.join(&rooms, room_id, out_tx.clone()).await);
        assert!(!subscriptions.join(&rooms, room_id, out_tx).await);

        let reached = rooms
            .publish(
                room_id,
                RoomEvent {
                    sender: SenderRole::Client,
                    message: "한 번만".to_string(),
                },
            )
            .await;
        assert_eq!(reached, 1);

        let first = out_rx.recv().await.unwrap();
        assert_eq!(
            first,
            ServerEvent::ReceiveMessage {
                sender: SenderRole::Client,
                message: "한 번만".to_string(),
            }
        );
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(out_rx.try_recv().is_err());
    }
}
