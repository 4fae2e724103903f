// db/jobdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::{Job, JobStatus};

#[async_trait]
pub trait JobExt {
    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn set_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<(), Error>;

    /// Closes active postings older than 24 hours. Returns the number of
    /// rows closed.
    async fn close_expired_jobs(&self) -> Result<u64, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, client_phone, title, pay, status, created_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }

    async fn close_expired_jobs(&self) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'closed'::job_status
            WHERE status = 'active'::job_status
              AND created_at <= NOW() - INTERVAL '24 hours'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
