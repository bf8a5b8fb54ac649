//! Rows returned by the local-state repositories.

use crate::model::ContactSubmission;

/// A contact submission waiting to be delivered to the backend.
#[derive(Debug, Clone)]
pub struct QueuedSubmission {
    pub id: i64,
    pub reference: String,
    pub submission: ContactSubmission,
    pub attempt: i32,
    pub last_error: Option<String>,
}
