// db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::usermodel::{Client, Worker};

#[async_trait]
pub trait UserExt {
    async fn get_worker_by_phone(&self, phone: &str) -> Result<Option<Worker>, Error>;

    async fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_worker_by_phone(&self, phone: &str) -> Result<Option<Worker>, Error> {
        sqlx::query_as::<_, Worker>(
            r#"
            SELECT phone, name, profile_image_url, created_at
            FROM workers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>, Error> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT phone, company_name, logo_url, created_at
            FROM clients
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }
}
