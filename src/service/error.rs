use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};
use axum::http::StatusCode;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Chat room {0} not found")]
    RoomNotFound(Uuid),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Worker {0} not found")]
    WorkerNotFound(String),

    #[error("Client {0} not found")]
    ClientNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::RoomNotFound(_)
            | ServiceError::JobNotFound(_)
            | ServiceError::WorkerNotFound(_)
            | ServiceError::ClientNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(e) => {
                // detail stays server-side
                tracing::error!("Database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            other => HttpError::new(other.to_string(), other.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let room_id = Uuid::new_v4();
        let err = HttpError::from(ServiceError::RoomNotFound(room_id));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains(&room_id.to_string()));
    }

    #[test]
    fn test_validation_mapping() {
        let err = HttpError::from(ServiceError::Validation("message must not be empty".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_is_redacted() {
        let err = HttpError::from(ServiceError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Server error");
    }
}
