// services/background_jobs.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::jobdb::JobExt;
use crate::AppState;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Periodically closes bidding on active jobs whose deadline has passed.
/// This is the system half of the `active -> bidding_closed` transition; the
/// owner-forced half lives in the lifecycle service.
pub async fn start_bidding_expiry_job(app_state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

    loop {
        interval.tick().await;

        match app_state.db_client.close_expired_bidding(Utc::now()).await {
            Ok(closed) => {
                for job in &closed {
                    tracing::info!("Bidding closed at deadline for job {} ({})", job.id, job.title);
                }
            }
            Err(err) => {
                tracing::warn!("Bidding expiry sweep failed: {}", err);
            }
        }
    }
}
