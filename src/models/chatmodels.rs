// models/chatmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "sender_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// Legacy mobile builds send "user" for the worker side; accepted on
    /// input, never emitted.
    #[serde(alias = "user")]
    Worker,
    Client,
}

impl SenderRole {
    /// The participant on the other side of the room.
    pub fn counterpart(&self) -> SenderRole {
        match self {
            SenderRole::Worker => SenderRole::Client,
            SenderRole::Client => SenderRole::Worker,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            SenderRole::Worker => "worker",
            SenderRole::Client => "client",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender: SenderRole,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Room-list row enriched with job and counterpart display fields.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ChatRoomSummary {
    pub id: Uuid,
    pub worker_phone: String,
    pub job_id: Uuid,
    pub client_phone: String,
    pub last_message: Option<String>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub unread_count_worker: i32,
    pub unread_count_client: i32,
    pub is_confirmed: bool,
    pub job_title: String,
    pub pay: i64,
    pub client_company_name: String,
    pub client_thumbnail_url: Option<String>,
    pub worker_name: String,
    pub worker_thumbnail_url: Option<String>,
}

/// Job summary shown in the room header.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatRoomDetail {
    pub job_id: Uuid,
    pub job_title: String,
    pub pay: i64,
    pub job_created_at: Option<DateTime<Utc>>,
    pub worker_phone: String,
    pub client_phone: String,
    pub worker_name: String,
    pub client_company_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterpart() {
        assert_eq!(SenderRole::Worker.counterpart(), SenderRole::Client);
        assert_eq!(SenderRole::Client.counterpart(), SenderRole::Worker);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(
            serde_json::from_str::<SenderRole>("\"worker\"").unwrap(),
            SenderRole::Worker
        );
        assert_eq!(
            serde_json::from_str::<SenderRole>("\"client\"").unwrap(),
            SenderRole::Client
        );
        assert_eq!(serde_json::to_string(&SenderRole::Worker).unwrap(), "\"worker\"");
    }

    #[test]
    fn test_legacy_user_alias_maps_to_worker() {
        let role = serde_json::from_str::<SenderRole>("\"user\"").unwrap();
        assert_eq!(role, SenderRole::Worker);
        // the alias is never emitted back
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"worker\"");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(serde_json::from_str::<SenderRole>("\"admin\"").is_err());
    }
}
