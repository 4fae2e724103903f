// models/usermodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Worker-side directory entry, keyed by phone number.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Worker {
    pub phone: String,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Client/employer directory entry, keyed by phone number.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Client {
    pub phone: String,
    pub company_name: String,
    pub logo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
