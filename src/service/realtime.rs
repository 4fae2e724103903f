// service/realtime.rs
use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::models::chatmodels::SenderRole;

const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Payload delivered to every connection subscribed to a room group.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomEvent {
    pub sender: SenderRole,
    pub message: String,
}

/// Per-room broadcast registry. A room's channel is created lazily on the
/// first join and dropped once publishing finds no receivers left or a
/// disconnect sweep finds it abandoned.
#[derive(Debug, Default)]
pub struct RoomChannels {
    rooms: Mutex<HashMap<Uuid, broadcast::Sender<RoomEvent>>>,
}

impl RoomChannels {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a room group, creating the channel on first join.
    pub async fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Broadcast an event to all current subscribers of a room, including
    /// the sender's own connection if it joined the group. Returns the
    /// number of receivers the event reached.
    pub async fn publish(&self, room_id: Uuid, event: RoomEvent) -> usize {
        let mut rooms = self.rooms.lock().await;
        match rooms.get(&room_id) {
            Some(tx) => match tx.send(event) {
                Ok(receivers) => receivers,
                Err(_) => {
                    // last receiver disconnected; drop the channel
                    rooms.remove(&room_id);
                    0
                }
            },
            None => 0,
        }
    }

    /// Drops channels whose subscribers are all gone. Called when a
    /// connection closes, so rooms that were joined but never published to
    /// do not accumulate in the registry.
    pub async fn sweep(&self) {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, tx| tx.receiver_count() > 0);
    }

    #[cfg(test)]
    async fn contains(&self, room_id: Uuid) -> bool {
        self.rooms.lock().await.contains_key(&room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(message: &str) -> RoomEvent {
        RoomEvent {
            sender: SenderRole::Worker,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_reaches_nobody() {
        let rooms = RoomChannels::new();
        let reached = rooms.publish(Uuid::new_v4(), event("hello")).await;
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let rooms = RoomChannels::new();
        let room_id = Uuid::new_v4();

        let mut rx = rooms.subscribe(room_id).await;
        let reached = rooms.publish(room_id, event("안녕하세요")).await;

        assert_eq!(reached, 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "안녕하세요");
        assert_eq!(received.sender, SenderRole::Worker);
    }

    #[tokio::test]
    async fn test_all_room_subscribers_receive_event() {
        let rooms = RoomChannels::new();
        let room_id = Uuid::new_v4();

        let mut rx1 = rooms.subscribe(room_id).await;
        let mut rx2 = rooms.subscribe(room_id).await;

        let reached = rooms.publish(room_id, event("broadcast")).await;
        assert_eq!(reached, 2);
        assert_eq!(rx1.recv().await.unwrap().message, "broadcast");
        assert_eq!(rx2.recv().await.unwrap().message, "broadcast");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let rooms = RoomChannels::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        let mut rx_a = rooms.subscribe(room_a).await;
        let _rx_b = rooms.subscribe(room_b).await;

        let reached = rooms.publish(room_a, event("only room a")).await;
        assert_eq!(reached, 1);
        assert_eq!(rx_a.recv().await.unwrap().message, "only room a");
    }

    #[tokio::test]
    async fn test_channel_dropped_after_all_receivers_gone() {
        let rooms = RoomChannels::new();
        let room_id = Uuid::new_v4();

        let rx = rooms.subscribe(room_id).await;
        drop(rx);

        assert_eq!(rooms.publish(room_id, event("gone")).await, 0);
        // channel was removed, a second publish hits the None arm
        assert_eq!(rooms.publish(room_id, event("still gone")).await, 0);
    }

    #[tokio::test]
    async fn test_sweep_drops_abandoned_channels_only() {
        let rooms = RoomChannels::new();
        let abandoned = Uuid::new_v4();
        let live = Uuid::new_v4();

        let rx = rooms.subscribe(abandoned).await;
        let mut live_rx = rooms.subscribe(live).await;
        drop(rx);

        rooms.sweep().await;

        assert!(!rooms.contains(abandoned).await);
        assert!(rooms.contains(live).await);
        assert_eq!(rooms.publish(live, event("still here")).await, 1);
        assert_eq!(live_rx.recv().await.unwrap().message, "still here");
    }
}
