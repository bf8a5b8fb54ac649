use super::model::QueuedSubmission;
use crate::model::ContactSubmission;
use crate::session::{Role, SessionContext};
use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/`, ensure the parent
/// directory exists and ask SQLite to create the file. In-memory URLs and
/// other schemes pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let query = match query_part {
        Some(q) if q.contains("mode=") => q.to_string(),
        Some(q) => format!("{}&mode=rwc", q),
        None => "mode=rwc".to_string(),
    };
    format!("sqlite://{}?{}", expanded_path, query)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn row_to_queued(row: &SqliteRow) -> QueuedSubmission {
    QueuedSubmission {
        id: row.get("id"),
        reference: row.get("reference"),
        submission: ContactSubmission {
            name: row.get("name"),
            email: row.get("email"),
            phone: row.try_get::<Option<String>, _>("phone").ok().flatten(),
            subject: row.get("subject"),
            message: row.get("message"),
        },
        attempt: row.get("attempt"),
        last_error: row.try_get::<Option<String>, _>("last_error").ok().flatten(),
    }
}

/// Queue a submission for later delivery; due immediately.
#[instrument(skip_all)]
pub async fn enqueue_submission(
    pool: &Pool,
    reference: &str,
    submission: &ContactSubmission,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO contact_queue (reference, name, email, phone, subject, message) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(reference)
    .bind(&submission.name)
    .bind(&submission.email)
    .bind(submission.phone.as_deref())
    .bind(&submission.subject)
    .bind(&submission.message)
    .fetch_one(pool)
    .await?;
    Ok(rec.get("id"))
}

#[instrument(skip_all)]
pub async fn next_due_submission(pool: &Pool) -> Result<Option<QueuedSubmission>> {
    let row = sqlx::query(
        "SELECT id, reference, name, email, phone, subject, message, attempt, last_error \
         FROM contact_queue WHERE datetime(due_at) <= CURRENT_TIMESTAMP \
         ORDER BY datetime(due_at) ASC, id ASC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(row_to_queued))
}

pub async fn list_queued_submissions(pool: &Pool) -> Result<Vec<QueuedSubmission>> {
    let rows = sqlx::query(
        "SELECT id, reference, name, email, phone, subject, message, attempt, last_error \
         FROM contact_queue ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_queued).collect())
}

#[instrument(skip_all)]
pub async fn delete_submission(pool: &Pool, id: i64) -> Result<()> {
    let res = sqlx::query("DELETE FROM contact_queue WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(anyhow!("queued submission {} not found", id));
    }
    Ok(())
}

/// Delay for the next attempt: 5s * 2^attempt, capped at `max_cap_secs`
/// (a non-positive cap means uncapped).
pub fn backoff_secs(attempt: i32, max_cap_secs: i64) -> i64 {
    let secs = 5_i64 * (1_i64 << attempt.clamp(0, 10));
    if max_cap_secs <= 0 {
        secs
    } else {
        secs.min(max_cap_secs)
    }
}

#[instrument(skip_all)]
pub async fn backoff_submission(
    pool: &Pool,
    id: i64,
    attempt: i32,
    max_cap_secs: i64,
    error: &str,
) -> Result<()> {
    let secs = backoff_secs(attempt, max_cap_secs);
    sqlx::query(
        "UPDATE contact_queue SET attempt = ?, last_error = ?, due_at = datetime('now', ? || ' seconds') WHERE id = ?",
    )
    .bind(attempt + 1)
    .bind(error)
    .bind(secs)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn count_queued_submissions(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_queue")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_due_submissions(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM contact_queue WHERE datetime(due_at) <= CURRENT_TIMESTAMP",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[instrument(skip_all)]
pub async fn save_session(pool: &Pool, session: &SessionContext) -> Result<()> {
    sqlx::query(
        "INSERT INTO session (id, token, role, updated_at) VALUES (1, ?, ?, CURRENT_TIMESTAMP) \
         ON CONFLICT(id) DO UPDATE SET token = excluded.token, role = excluded.role, \
         updated_at = CURRENT_TIMESTAMP",
    )
    .bind(session.bearer())
    .bind(session.role().as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// The stored session, or a guest session if none was saved.
#[instrument(skip_all)]
pub async fn load_session(pool: &Pool) -> Result<SessionContext> {
    let row = sqlx::query("SELECT token, role FROM session WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(SessionContext::guest());
    };
    let token: Option<String> = row.try_get("token").ok().flatten();
    let role_str: String = row.get("role");
    let role = Role::parse_role(&role_str)
        .ok_or_else(|| anyhow!("stored session has unknown role {}", role_str))?;
    Ok(SessionContext::new(token, role))
}

#[instrument(skip_all)]
pub async fn clear_session(pool: &Pool) -> Result<()> {
    sqlx::query("DELETE FROM session").execute(pool).await?;
    Ok(())
}
