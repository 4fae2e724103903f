// service/chat_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{chatdb::ChatRoomExt, db::DBClient, jobdb::JobExt},
    models::{
        chatmodels::{ChatMessage, SenderRole},
        jobmodel::JobStatus,
    },
    service::{
        error::ServiceError,
        realtime::{RoomChannels, RoomEvent},
    },
};

/// Owns the message write path. Both the REST handler and the websocket
/// handler call into this service, so counter bookkeeping and fan-out live
/// in exactly one place.
#[derive(Debug, Clone)]
pub struct ChatService {
    db_client: Arc<DBClient>,
    rooms: Arc<RoomChannels>,
}

impl ChatService {
    pub fn new(db_client: Arc<DBClient>, rooms: Arc<RoomChannels>) -> Self {
        Self { db_client, rooms }
    }

    /// Persists the message (insert + counterpart counter + room snapshot,
    /// one transaction) and broadcasts it to the room's subscribers.
    pub async fn send_message(
        &self,
        room_id: Uuid,
        sender: SenderRole,
        message: String,
    ) -> Result<ChatMessage, ServiceError> {
        if message.trim().is_empty() {
            return Err(ServiceError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        let saved = self
            .db_client
            .send_message(room_id, sender, &message)
            .await
            .map_err(|e| missing_room_as_not_found(room_id, e))?;

        let reached = self
            .rooms
            .publish(
                room_id,
                RoomEvent {
                    sender,
                    message: saved.message.clone(),
                },
            )
            .await;
        tracing::debug!(
            "Message {} in room {} fanned out to {} subscribers",
            saved.id,
            room_id,
            reached
        );

        Ok(saved)
    }

    /// Returns the room's messages oldest first, marking the counterpart's
    /// messages read and resetting the reader's unread counter on the way.
    pub async fn fetch_messages(
        &self,
        room_id: Uuid,
        reader: SenderRole,
    ) -> Result<Vec<ChatMessage>, ServiceError> {
        let messages = self.db_client.fetch_messages(room_id, reader).await?;
        tracing::debug!(
            "{} fetched {} messages from room {}",
            reader.to_str(),
            messages.len(),
            room_id
        );
        Ok(messages)
    }

    /// Flags the room as hired. Updating the job's status is a best-effort
    /// second step; its failure is logged, not reported to the caller.
    pub async fn confirm_hire(&self, room_id: Uuid) -> Result<(), ServiceError> {
        let job_id = self
            .db_client
            .confirm_hire(room_id)
            .await?
            .ok_or(ServiceError::RoomNotFound(room_id))?;

        if let Err(e) = self
            .db_client
            .set_job_status(job_id, JobStatus::Confirmed)
            .await
        {
            tracing::error!(
                "Room {} confirmed but job {} status update failed: {}",
                room_id,
                job_id,
                e
            );
        }

        Ok(())
    }
}

/// The storage layer signals a send to an unknown room with `RowNotFound`;
/// every other database failure stays a server-side error.
fn missing_room_as_not_found(room_id: Uuid, e: sqlx::Error) -> ServiceError {
    match e {
        sqlx::Error::RowNotFound => ServiceError::RoomNotFound(room_id),
        other => ServiceError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use axum::http::StatusCode;

    #[test]
    fn test_send_to_unknown_room_maps_to_not_found() {
        let room_id = Uuid::new_v4();
        let err = missing_room_as_not_found(room_id, sqlx::Error::RowNotFound);
        assert!(matches!(err, ServiceError::RoomNotFound(id) if id == room_id));
        assert_eq!(HttpError::from(err).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_send_failures_stay_server_errors() {
        let err = missing_room_as_not_found(Uuid::new_v4(), sqlx::Error::PoolTimedOut);
        assert!(matches!(err, ServiceError::Database(_)));
        assert_eq!(
            HttpError::from(err).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
