use tracing::{debug, info};

use super::{RequestToken, TokenIssuer, ViewState};
use crate::api::ContentService;
use crate::content::{self, Fetched};
use crate::fallback::Catalog;
use crate::model::Post;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSnapshot {
    pub post: Post,
    /// Sidebar, excluding the post being shown.
    pub recent: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct DetailTicket {
    pub token: RequestToken,
    pub slug: String,
    recent_limit: u32,
}

#[derive(Debug, Clone)]
pub struct DetailLoaded {
    pub token: RequestToken,
    pub snapshot: Fetched<DetailSnapshot>,
}

/// Single-post page. There is no error state: a failed or missing post
/// resolves to fallback content.
#[derive(Debug)]
pub struct DetailView {
    slug: String,
    recent_limit: u32,
    tokens: TokenIssuer,
    state: ViewState<DetailSnapshot>,
}

impl DetailView {
    pub fn new(slug: impl Into<String>, recent_limit: u32) -> Self {
        Self {
            slug: slug.into(),
            recent_limit,
            tokens: TokenIssuer::default(),
            state: ViewState::Loading,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn state(&self) -> &ViewState<DetailSnapshot> {
        &self.state
    }

    pub fn navigate(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.tokens.issue();
        self.state = ViewState::Loading;
    }

    pub fn begin(&mut self) -> DetailTicket {
        DetailTicket {
            token: self.tokens.issue(),
            slug: self.slug.clone(),
            recent_limit: self.recent_limit,
        }
    }

    pub async fn fetch(
        service: &dyn ContentService,
        catalog: &Catalog,
        ticket: DetailTicket,
    ) -> DetailLoaded {
        // One extra so the sidebar still has `recent_limit` entries after
        // dropping the current post.
        let fetch_limit = ticket.recent_limit.saturating_add(1);
        let (post, recent) = futures::join!(
            content::post_by_slug(service, catalog, &ticket.slug),
            content::list_recent(service, catalog, fetch_limit)
        );

        // The post and the sidebar degrade independently; the snapshot is
        // tagged as fallback if either did.
        let degraded = post.is_fallback() || recent.is_fallback();
        let post = post.into_inner();
        let recent = sidebar(recent.into_inner(), &post, ticket.recent_limit);
        let snapshot = DetailSnapshot { post, recent };
        let snapshot = if degraded {
            Fetched::Fallback(snapshot)
        } else {
            Fetched::Live(snapshot)
        };

        DetailLoaded {
            token: ticket.token,
            snapshot,
        }
    }

    pub fn apply(&mut self, loaded: DetailLoaded) -> bool {
        if !self.tokens.is_latest(loaded.token) {
            debug!(token = loaded.token.value(), "discarding stale post response");
            return false;
        }
        info!(
            slug = %self.slug,
            fallback = loaded.snapshot.is_fallback(),
            "post view ready"
        );
        self.state = ViewState::Ready(loaded.snapshot);
        true
    }

    pub async fn refresh(
        &mut self,
        service: &dyn ContentService,
        catalog: &Catalog,
    ) -> &ViewState<DetailSnapshot> {
        let ticket = self.begin();
        let loaded = Self::fetch(service, catalog, ticket).await;
        self.apply(loaded);
        &self.state
    }
}

fn sidebar(recent: Vec<Post>, current: &Post, limit: u32) -> Vec<Post> {
    recent
        .into_iter()
        .filter(|p| p.slug != current.slug)
        .take(limit as usize)
        .collect()
}
