use crate::api::ContentService;
use crate::db::{self, Pool};
use anyhow::Result;
use tracing::{info, instrument, warn};

/// Deliver the next due queued contact submission. Returns whether one was
/// attempted. Deliveries that fail because the backend is unavailable are
/// rescheduled with capped backoff; a submission the backend rejects is
/// dropped from the queue.
#[instrument(skip_all)]
pub async fn process_next_submission(
    pool: &Pool,
    service: &dyn ContentService,
    max_backoff_secs: i64,
) -> Result<bool> {
    let Some(task) = db::next_due_submission(pool).await? else {
        return Ok(false);
    };

    match service.submit_contact(&task.submission).await {
        Ok(_) => {
            db::delete_submission(pool, task.id).await?;
            info!(id = task.id, reference = %task.reference, "queued submission delivered");
        }
        Err(err) if !err.is_unavailable() => {
            db::delete_submission(pool, task.id).await?;
            warn!(
                %err,
                id = task.id,
                reference = %task.reference,
                "queued submission rejected; dropped"
            );
        }
        Err(err) => {
            warn!(
                %err,
                id = task.id,
                reference = %task.reference,
                attempt = task.attempt,
                "queued submission failed; backoff"
            );
            db::backoff_submission(pool, task.id, task.attempt, max_backoff_secs, &err.to_string())
                .await?;
        }
    }
    Ok(true)
}
