//! Fetch-or-fallback retrieval shared by the list, detail and contact views.
//!
//! Failures never reach the caller as errors. They come back as
//! `Fetched::Fallback` so degraded mode stays visible to logging while the
//! rendered shape is identical.
use tracing::warn;

use crate::api::{ApiError, ContentService};
use crate::fallback::Catalog;
use crate::model::{Category, ContactInfo, Post, PostPage, SocialMedia};
use crate::query::ListQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Live(T),
    Fallback(T),
}

impl<T> Fetched<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Fetched::Fallback(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Fetched::Live(v) | Fetched::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(v) | Fetched::Fallback(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Live(v) => Fetched::Live(f(v)),
            Fetched::Fallback(v) => Fetched::Fallback(f(v)),
        }
    }

    /// Turn a service result into a tagged value, substituting `fallback` on error.
    pub fn or_fallback(
        result: Result<T, ApiError>,
        what: &'static str,
        fallback: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(v) => Fetched::Live(v),
            Err(err) => {
                warn!(%err, what, "content service failed; serving fallback");
                Fetched::Fallback(fallback())
            }
        }
    }
}

pub async fn list_posts(
    service: &dyn ContentService,
    catalog: &Catalog,
    query: &ListQuery,
    per_page: u32,
) -> Fetched<PostPage> {
    let result = service
        .list_posts(
            query.page,
            per_page,
            query.category.as_deref(),
            query.search.as_deref(),
        )
        .await;
    Fetched::or_fallback(result, "posts", || catalog.query(query, per_page))
}

pub async fn list_categories(service: &dyn ContentService, catalog: &Catalog) -> Fetched<Vec<Category>> {
    let result = service.list_categories().await;
    Fetched::or_fallback(result, "categories", || catalog.categories())
}

pub async fn list_recent(
    service: &dyn ContentService,
    catalog: &Catalog,
    limit: u32,
) -> Fetched<Vec<Post>> {
    let result = service.list_recent(limit).await;
    Fetched::or_fallback(result, "recent posts", || catalog.recent(limit))
}

pub async fn list_featured(service: &dyn ContentService, catalog: &Catalog) -> Fetched<Vec<Post>> {
    let result = service.list_featured().await;
    Fetched::or_fallback(result, "featured posts", || catalog.featured())
}

/// A 404 is treated like any other failure: the catalog's answer for the
/// slug (or its default post) is served.
pub async fn post_by_slug(service: &dyn ContentService, catalog: &Catalog, slug: &str) -> Fetched<Post> {
    let result = service.get_post_by_slug(slug).await;
    Fetched::or_fallback(result, "post", || catalog.post_by_slug(slug).clone())
}

pub async fn contact_info(service: &dyn ContentService, catalog: &Catalog) -> Fetched<ContactInfo> {
    let result = service.contact_info().await;
    Fetched::or_fallback(result, "contact info", || catalog.contact_info().clone())
}

pub async fn social_media(service: &dyn ContentService, catalog: &Catalog) -> Fetched<SocialMedia> {
    let result = service.social_media().await;
    Fetched::or_fallback(result, "social media", || catalog.social_media().clone())
}
