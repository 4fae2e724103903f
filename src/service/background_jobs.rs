// service/background_jobs.rs
use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::{db::jobdb::JobExt, AppState};

/// Start background job that closes postings active for more than 24 hours.
pub async fn start_auto_close_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(300)); // Run every 5 minutes

    loop {
        interval.tick().await;

        match app_state.db_client.close_expired_jobs().await {
            Ok(closed) => tracing::info!("Job auto-close sweep completed: {} jobs closed", closed),
            Err(e) => tracing::error!("Job auto-close sweep failed: {}", e),
        }
    }
}
