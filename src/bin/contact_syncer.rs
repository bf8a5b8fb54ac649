use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use furnish_content::api::ApiClient;
use furnish_content::config;
use furnish_content::db;
use furnish_content::outbox;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Deliver all queued contact submissions and exit when the queue is empty"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Exit as soon as only submissions in backoff remain
    #[arg(long)]
    skip_failed: bool,

    /// Give up once any submission has failed this many times
    #[arg(long, default_value = "5")]
    max_failed_attempts: i32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.app.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let client = ApiClient::from_config(&cfg)?;
    let max_backoff = cfg.app.max_backoff_seconds as i64;

    let remaining = db::count_queued_submissions(&pool).await?;
    info!(remaining, "starting contact queue sync");
    if remaining == 0 {
        info!("contact queue is empty, exiting");
        return Ok(());
    }

    let mut attempted = 0;
    loop {
        match outbox::process_next_submission(&pool, &client, max_backoff).await {
            Ok(true) => {
                attempted += 1;
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                error!(?err, "error processing queued submission");
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        }

        // Nothing due right now.
        let queued = db::list_queued_submissions(&pool).await?;
        if queued.is_empty() {
            info!(attempted, "all queued submissions delivered");
            break;
        }

        let max_attempts = queued.iter().map(|q| q.attempt).max().unwrap_or(0);
        warn!(
            remaining = queued.len(),
            max_attempts,
            "no due submissions; remaining ones are in backoff"
        );
        if max_attempts >= args.max_failed_attempts {
            error!(
                threshold = args.max_failed_attempts,
                "submissions exceeded the failure threshold, exiting"
            );
            break;
        }
        if args.skip_failed {
            warn!("--skip-failed specified, exiting with submissions still queued");
            break;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    Ok(())
}
