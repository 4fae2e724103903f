use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{chatdb::ChatRoomExt, jobdb::JobExt, userdb::UserExt},
    error::HttpError,
    models::chatmodels::SenderRole,
    service::error::ServiceError,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/start", post(start_chat))
        .route("/list", get(get_chat_list))
        .route("/messages", get(get_messages))
        .route("/send", post(send_message))
        .route("/leave/:room_id", delete(leave_room))
        .route("/detail/:room_id", get(get_chat_detail))
        .route("/confirm/:room_id", post(confirm_hire))
        .route("/unread-count", get(get_unread_count))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChatDto {
    pub user_phone: Option<String>,
    pub job_id: Option<Uuid>,
    pub client_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    pub user_phone: String,
    pub user_type: SenderRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub room_id: Uuid,
    pub reader: SenderRole,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    pub room_id: Option<Uuid>,
    pub sender: Option<SenderRole>,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

pub async fn start_chat(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<StartChatDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (worker_phone, job_id, client_phone) =
        match (body.user_phone, body.job_id, body.client_phone) {
            (Some(worker), Some(job), Some(client)) if !worker.is_empty() && !client.is_empty() => {
                (worker, job, client)
            }
            _ => {
                return Err(HttpError::bad_request(
                    "userPhone, jobId and clientPhone are required",
                ))
            }
        };

    // A room is keyed on these three; all must exist before first contact.
    app_state
        .db_client
        .get_worker_by_phone(&worker_phone)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::WorkerNotFound(worker_phone.clone()))?;

    app_state
        .db_client
        .get_client_by_phone(&client_phone)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::ClientNotFound(client_phone.clone()))?;

    app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::JobNotFound(job_id))?;

    let (room_id, created) = app_state
        .db_client
        .find_or_create_room(&worker_phone, job_id, &client_phone)
        .await
        .map_err(ServiceError::from)?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(serde_json::json!({ "roomId": room_id }))))
}

pub async fn get_chat_list(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ParticipantQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let rooms = app_state
        .db_client
        .get_user_rooms(&query.user_phone, query.user_type)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(rooms))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .chat_service
        .fetch_messages(query.room_id, query.reader)
        .await?;

    Ok(Json(messages))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (room_id, sender, message) = match (body.room_id, body.sender, body.message) {
        (Some(room_id), Some(sender), Some(message)) => (room_id, sender, message),
        _ => {
            return Err(HttpError::bad_request(
                "roomId, sender and message are required",
            ))
        }
    };

    let saved = app_state
        .chat_service
        .send_message(room_id, sender, message)
        .await?;

    Ok(Json(saved))
}

pub async fn leave_room(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let left = app_state
        .db_client
        .leave_room(room_id)
        .await
        .map_err(ServiceError::from)?;

    if !left {
        return Err(HttpError::not_found("Chat room not found"));
    }

    Ok(Json(serde_json::json!({ "message": "Left chat room" })))
}

pub async fn get_chat_detail(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state
        .db_client
        .get_room_detail(room_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| HttpError::not_found("Chat room not found"))?;

    Ok(Json(detail))
}

pub async fn confirm_hire(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.chat_service.confirm_hire(room_id).await?;

    Ok(Json(serde_json::json!({ "message": "Hire confirmed" })))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ParticipantQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state
        .db_client
        .get_unread_total(&query.user_phone, query.user_type)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(serde_json::json!({ "unreadCount": count })))
}
