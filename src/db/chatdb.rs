// db/chatdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::chatmodels::*;

#[async_trait]
pub trait ChatRoomExt {
    // Room directory
    async fn find_or_create_room(
        &self,
        worker_phone: &str,
        job_id: Uuid,
        client_phone: &str,
    ) -> Result<(Uuid, bool), Error>;

    async fn get_user_rooms(
        &self,
        phone: &str,
        role: SenderRole,
    ) -> Result<Vec<ChatRoomSummary>, Error>;

    async fn get_room_detail(&self, room_id: Uuid) -> Result<Option<ChatRoomDetail>, Error>;

    async fn leave_room(&self, room_id: Uuid) -> Result<bool, Error>;

    /// Marks the room confirmed and returns its job id, or None when the
    /// room does not exist.
    async fn confirm_hire(&self, room_id: Uuid) -> Result<Option<Uuid>, Error>;

    // Message store
    async fn send_message(
        &self,
        room_id: Uuid,
        sender: SenderRole,
        message: &str,
    ) -> Result<ChatMessage, Error>;

    async fn fetch_messages(
        &self,
        room_id: Uuid,
        reader: SenderRole,
    ) -> Result<Vec<ChatMessage>, Error>;

    async fn get_unread_total(&self, phone: &str, role: SenderRole) -> Result<i64, Error>;
}

#[async_trait]
impl ChatRoomExt for DBClient {
    async fn find_or_create_room(
        &self,
        worker_phone: &str,
        job_id: Uuid,
        client_phone: &str,
    ) -> Result<(Uuid, bool), Error> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM chat_rooms
            WHERE worker_phone = $1 AND job_id = $2 AND client_phone = $3
            "#,
        )
        .bind(worker_phone)
        .bind(job_id)
        .bind(client_phone)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = existing {
            return Ok((id, false));
        }

        // The UNIQUE constraint on the triple makes concurrent first contact
        // safe: at most one insert wins, the loser re-selects the winner's row.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO chat_rooms (worker_phone, job_id, client_phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (worker_phone, job_id, client_phone) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(worker_phone)
        .bind(job_id)
        .bind(client_phone)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok((id, true)),
            None => {
                let id = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    SELECT id FROM chat_rooms
                    WHERE worker_phone = $1 AND job_id = $2 AND client_phone = $3
                    "#,
                )
                .bind(worker_phone)
                .bind(job_id)
                .bind(client_phone)
                .fetch_one(&self.pool)
                .await?;
                Ok((id, false))
            }
        }
    }

    async fn get_user_rooms(
        &self,
        phone: &str,
        role: SenderRole,
    ) -> Result<Vec<ChatRoomSummary>, Error> {
        let sql = match role {
            SenderRole::Worker => {
                r#"
                SELECT cr.id, cr.worker_phone, cr.job_id, cr.client_phone,
                       cr.last_message, cr.last_sent_at,
                       cr.unread_count_worker, cr.unread_count_client, cr.is_confirmed,
                       j.title AS job_title, j.pay,
                       c.company_name AS client_company_name,
                       c.logo_url AS client_thumbnail_url,
                       w.name AS worker_name,
                       w.profile_image_url AS worker_thumbnail_url
                FROM chat_rooms cr
                JOIN jobs j ON cr.job_id = j.id
                JOIN clients c ON cr.client_phone = c.phone
                JOIN workers w ON cr.worker_phone = w.phone
                WHERE cr.worker_phone = $1 AND cr.is_active = TRUE
                ORDER BY cr.last_sent_at DESC NULLS LAST, cr.created_at DESC
                "#
            }
            SenderRole::Client => {
                r#"
                SELECT cr.id, cr.worker_phone, cr.job_id, cr.client_phone,
                       cr.last_message, cr.last_sent_at,
                       cr.unread_count_worker, cr.unread_count_client, cr.is_confirmed,
                       j.title AS job_title, j.pay,
                       c.company_name AS client_company_name,
                       c.logo_url AS client_thumbnail_url,
                       w.name AS worker_name,
                       w.profile_image_url AS worker_thumbnail_url
                FROM chat_rooms cr
                JOIN jobs j ON cr.job_id = j.id
                JOIN clients c ON cr.client_phone = c.phone
                JOIN workers w ON cr.worker_phone = w.phone
                WHERE cr.client_phone = $1 AND cr.is_active = TRUE
                ORDER BY cr.last_sent_at DESC NULLS LAST, cr.created_at DESC
                "#
            }
        };

        sqlx::query_as::<_, ChatRoomSummary>(sql)
            .bind(phone)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_room_detail(&self, room_id: Uuid) -> Result<Option<ChatRoomDetail>, Error> {
        sqlx::query_as::<_, ChatRoomDetail>(
            r#"
            SELECT j.id AS job_id, j.title AS job_title, j.pay,
                   j.created_at AS job_created_at,
                   cr.worker_phone, cr.client_phone,
                   w.name AS worker_name,
                   c.company_name AS client_company_name
            FROM chat_rooms cr
            JOIN jobs j ON cr.job_id = j.id
            JOIN workers w ON cr.worker_phone = w.phone
            JOIN clients c ON cr.client_phone = c.phone
            WHERE cr.id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn leave_room(&self, room_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE chat_rooms
            SET is_active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn confirm_hire(&self, room_id: Uuid) -> Result<Option<Uuid>, Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE chat_rooms
            SET is_confirmed = TRUE
            WHERE id = $1
            RETURNING job_id
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn send_message(
        &self,
        room_id: Uuid,
        sender: SenderRole,
        message: &str,
    ) -> Result<ChatMessage, Error> {
        let mut tx = self.pool.begin().await?;

        // Check the room up front; letting the insert hit the room_id
        // foreign key instead would surface as an opaque database error.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM chat_rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::RowNotFound)?;

        let saved = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (room_id, sender, message)
            VALUES ($1, $2, $3)
            RETURNING id, room_id, sender, message, is_read, created_at
            "#,
        )
        .bind(room_id)
        .bind(sender)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        // Counterpart counter increment and snapshot update in one relative
        // statement, inside the same transaction as the insert.
        let update_sql = match sender.counterpart() {
            SenderRole::Worker => {
                r#"
                UPDATE chat_rooms
                SET unread_count_worker = unread_count_worker + 1,
                    last_message = $2,
                    last_sent_at = NOW()
                WHERE id = $1
                "#
            }
            SenderRole::Client => {
                r#"
                UPDATE chat_rooms
                SET unread_count_client = unread_count_client + 1,
                    last_message = $2,
                    last_sent_at = NOW()
                WHERE id = $1
                "#
            }
        };

        sqlx::query(update_sql)
            .bind(room_id)
            .bind(message)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn fetch_messages(
        &self,
        room_id: Uuid,
        reader: SenderRole,
    ) -> Result<Vec<ChatMessage>, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE chat_messages
            SET is_read = TRUE
            WHERE room_id = $1
              AND sender <> $2
              AND is_read = FALSE
            "#,
        )
        .bind(room_id)
        .bind(reader)
        .execute(&mut *tx)
        .await?;

        let reset_sql = match reader {
            SenderRole::Worker => "UPDATE chat_rooms SET unread_count_worker = 0 WHERE id = $1",
            SenderRole::Client => "UPDATE chat_rooms SET unread_count_client = 0 WHERE id = $1",
        };

        sqlx::query(reset_sql)
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, room_id, sender, message, is_read, created_at
            FROM chat_messages
            WHERE room_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(messages)
    }

    async fn get_unread_total(&self, phone: &str, role: SenderRole) -> Result<i64, Error> {
        let sql = match role {
            SenderRole::Worker => {
                r#"
                SELECT COALESCE(SUM(unread_count_worker), 0)
                FROM chat_rooms
                WHERE worker_phone = $1 AND is_active = TRUE
                "#
            }
            SenderRole::Client => {
                r#"
                SELECT COALESCE(SUM(unread_count_client), 0)
                FROM chat_rooms
                WHERE client_phone = $1 AND is_active = TRUE
                "#
            }
        };

        sqlx::query_scalar::<_, i64>(sql)
            .bind(phone)
            .fetch_one(&self.pool)
            .await
    }
}
