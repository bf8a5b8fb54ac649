use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use furnish_content::api::ApiClient;
use furnish_content::config::{self, Config};
use furnish_content::contact::{self, ContactForm, SubmitError};
use furnish_content::content;
use furnish_content::db::{self, Pool};
use furnish_content::fallback::Catalog;
use furnish_content::model::PostDraft;
use furnish_content::outbox;
use furnish_content::render;
use furnish_content::session::{Role, SessionContext};
use furnish_content::views::{DetailView, ListView};

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse the furniture blog and contact page from the terminal")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Blog listing. `--query` takes a URL query string such as `page=2&category=Kitchen`.
    List {
        #[arg(long, conflicts_with_all = ["page", "category", "search"])]
        query: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// A single post by slug.
    Show { slug: String },
    /// Featured posts.
    Featured,
    /// Address, phone, hours and social profiles.
    ContactInfo,
    /// Send the contact form (queued locally if the backend is down).
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Keep delivering queued contact submissions.
    Sync,
    #[command(subcommand)]
    Session(SessionCommand),
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Store a token and role for admin commands.
    Set {
        #[arg(long)]
        token: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
    Show,
    Clear,
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    List,
    /// Create a post from a JSON draft file.
    Create { file: PathBuf },
    /// Replace a post from a JSON draft file.
    Update { id: i64, file: PathBuf },
    Delete { id: i64 },
}

async fn open_pool(cfg: &Config) -> Result<Pool> {
    cfg.ensure_dirs()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.app.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}

fn read_draft(path: &Path) -> Result<PostDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid post draft in {}", path.display()))
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
    let client = ApiClient::from_config(&cfg)?;
    let catalog = Catalog::builtin();

    match args.command {
        Command::List {
            query,
            page,
            category,
            search,
        } => {
            let mut view = match query {
                Some(raw) => ListView::from_url_query(&raw, cfg.blog.per_page, cfg.blog.recent_limit),
                None => ListView::new(cfg.blog.per_page, cfg.blog.recent_limit),
            };
            if category.is_some() {
                view.set_category(category);
            }
            if search.is_some() {
                view.set_search(search);
            }
            if let Some(page) = page {
                view.set_page(page);
            }
            let state = view.refresh(&client, catalog).await;
            print!("{}", render::list(state));
            let url = view.url_query();
            if !url.is_empty() {
                println!("\nURL: /blog?{}", url);
            }
        }
        Command::Show { slug } => {
            let mut view = DetailView::new(slug, cfg.blog.recent_limit);
            let state = view.refresh(&client, catalog).await;
            print!("{}", render::detail(state));
        }
        Command::Featured => {
            let featured = content::list_featured(&client, catalog).await;
            let fallback = featured.is_fallback();
            print!("{}", render::featured(featured.get(), fallback));
        }
        Command::ContactInfo => {
            let page = contact::contact_page(&client, catalog).await;
            print!("{}", render::contact(page.get(), page.is_fallback()));
        }
        Command::Contact {
            name,
            email,
            phone,
            subject,
            message,
        } => {
            let pool = open_pool(&cfg).await?;
            let form = ContactForm {
                name,
                email,
                phone,
                subject,
                message,
            };
            match contact::submit(&client, &pool, &form).await {
                Ok(outcome) => println!("{}", outcome.message()),
                Err(SubmitError::Invalid(err)) => {
                    bail!("{}: {}", err.field(), err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Sync => {
            let pool = open_pool(&cfg).await?;
            let poll_sleep = Duration::from_millis(cfg.app.poll_interval_ms);
            let max_backoff = cfg.app.max_backoff_seconds as i64;
            info!("starting contact queue worker");
            loop {
                match outbox::process_next_submission(&pool, &client, max_backoff).await {
                    Ok(true) => {}
                    Ok(false) => tokio::time::sleep(poll_sleep).await,
                    Err(err) => {
                        error!(?err, "contact queue worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
        Command::Session(cmd) => {
            let pool = open_pool(&cfg).await?;
            match cmd {
                SessionCommand::Set { token, role } => {
                    let role = Role::parse_role(&role)
                        .with_context(|| format!("unknown role '{}'", role))?;
                    db::save_session(&pool, &SessionContext::new(Some(token), role)).await?;
                    println!("session saved ({})", role.as_str());
                }
                SessionCommand::Show => {
                    let session = db::load_session(&pool).await?;
                    println!(
                        "role: {}, token: {}",
                        session.role().as_str(),
                        if session.is_authenticated() { "set" } else { "none" }
                    );
                }
                SessionCommand::Clear => {
                    db::clear_session(&pool).await?;
                    println!("session cleared");
                }
            }
        }
        Command::Admin(cmd) => {
            let pool = open_pool(&cfg).await?;
            let session = db::load_session(&pool).await?;
            match cmd {
                AdminCommand::List => {
                    for post in client.admin_list_posts(&session).await? {
                        println!("{:>5}  {}  {}", post.id, post.slug, post.title);
                    }
                }
                AdminCommand::Create { file } => {
                    let post = client.admin_create_post(&session, &read_draft(&file)?).await?;
                    println!("created post {} ({})", post.id, post.slug);
                }
                AdminCommand::Update { id, file } => {
                    let post = client
                        .admin_update_post(&session, id, &read_draft(&file)?)
                        .await?;
                    println!("updated post {} ({})", post.id, post.slug);
                }
                AdminCommand::Delete { id } => {
                    client.admin_delete_post(&session, id).await?;
                    println!("deleted post {}", id);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use furnish_content::query::ListQuery;

    #[test]
    fn list_query_flag_conflicts_with_filters() {
        let res = Args::try_parse_from(["furnish", "list", "--query", "page=2", "--page", "3"]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_admin_update() {
        let args = Args::try_parse_from(["furnish", "admin", "update", "7", "draft.json"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Admin(AdminCommand::Update { id: 7, .. })
        ));
    }

    #[test]
    fn default_query_matches_cleared() {
        assert_eq!(ListView::new(6, 3).query(), &ListQuery::cleared());
    }
}
