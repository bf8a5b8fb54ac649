use tracing::{debug, info};

use super::{RequestToken, TokenIssuer, ViewState};
use crate::api::ContentService;
use crate::content::{self, Fetched};
use crate::fallback::Catalog;
use crate::model::{Category, Post, PostPage};
use crate::query::ListQuery;

/// Everything the blog listing renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub query: ListQuery,
    pub page: PostPage,
    pub categories: Vec<Category>,
    pub recent: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct ListTicket {
    pub token: RequestToken,
    pub query: ListQuery,
    per_page: u32,
    recent_limit: u32,
}

#[derive(Debug, Clone)]
pub struct ListLoaded {
    pub token: RequestToken,
    pub snapshot: Fetched<ListSnapshot>,
}

#[derive(Debug)]
pub struct ListView {
    per_page: u32,
    recent_limit: u32,
    query: ListQuery,
    tokens: TokenIssuer,
    state: ViewState<ListSnapshot>,
}

impl ListView {
    pub fn new(per_page: u32, recent_limit: u32) -> Self {
        Self::with_query(ListQuery::default(), per_page, recent_limit)
    }

    pub fn from_url_query(raw: &str, per_page: u32, recent_limit: u32) -> Self {
        Self::with_query(ListQuery::from_url_query(raw), per_page, recent_limit)
    }

    fn with_query(query: ListQuery, per_page: u32, recent_limit: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            recent_limit,
            query,
            tokens: TokenIssuer::default(),
            state: ViewState::Loading,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn url_query(&self) -> String {
        self.query.to_url_query()
    }

    pub fn state(&self) -> &ViewState<ListSnapshot> {
        &self.state
    }

    /// Any query change invalidates in-flight fetches and returns to `Loading`.
    fn transition(&mut self, query: ListQuery) {
        if query != self.query {
            debug!(from = %self.query.to_url_query(), to = %query.to_url_query(), "list query changed");
        }
        self.query = query;
        self.tokens.issue();
        self.state = ViewState::Loading;
    }

    pub fn navigate(&mut self, raw: &str) {
        self.transition(ListQuery::from_url_query(raw));
    }

    pub fn set_page(&mut self, page: u32) {
        self.transition(self.query.clone().with_page(page));
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.transition(self.query.clone().with_category(category));
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.transition(self.query.clone().with_search(search));
    }

    pub fn clear_filters(&mut self) {
        self.transition(ListQuery::cleared());
    }

    /// Issue a token for the current query.
    pub fn begin(&mut self) -> ListTicket {
        ListTicket {
            token: self.tokens.issue(),
            query: self.query.clone(),
            per_page: self.per_page,
            recent_limit: self.recent_limit,
        }
    }

    /// Fetch posts, categories and recent posts concurrently. If any of them
    /// falls back, all three come from the catalog.
    pub async fn fetch(
        service: &dyn ContentService,
        catalog: &Catalog,
        ticket: ListTicket,
    ) -> ListLoaded {
        let (page, categories, recent) = futures::join!(
            content::list_posts(service, catalog, &ticket.query, ticket.per_page),
            content::list_categories(service, catalog),
            content::list_recent(service, catalog, ticket.recent_limit)
        );

        let degraded = page.is_fallback() || categories.is_fallback() || recent.is_fallback();
        let snapshot = if degraded {
            Fetched::Fallback(ListSnapshot {
                page: catalog.query(&ticket.query, ticket.per_page),
                categories: catalog.categories(),
                recent: catalog.recent(ticket.recent_limit),
                query: ticket.query,
            })
        } else {
            Fetched::Live(ListSnapshot {
                query: ticket.query,
                page: page.into_inner(),
                categories: categories.into_inner(),
                recent: recent.into_inner(),
            })
        };

        ListLoaded {
            token: ticket.token,
            snapshot,
        }
    }

    /// Apply a fetch outcome. Returns false (and changes nothing) when the
    /// outcome belongs to a superseded request.
    pub fn apply(&mut self, loaded: ListLoaded) -> bool {
        if !self.tokens.is_latest(loaded.token) {
            debug!(token = loaded.token.value(), "discarding stale list response");
            return false;
        }
        info!(
            query = %self.query.to_url_query(),
            fallback = loaded.snapshot.is_fallback(),
            "list view ready"
        );
        self.state = ViewState::Ready(loaded.snapshot);
        true
    }

    pub async fn refresh(
        &mut self,
        service: &dyn ContentService,
        catalog: &Catalog,
    ) -> &ViewState<ListSnapshot> {
        let ticket = self.begin();
        let loaded = Self::fetch(service, catalog, ticket).await;
        self.apply(loaded);
        &self.state
    }
}
