//! Static sample content served when the content service is unavailable.
//!
//! The catalog answers the same questions as the live service (filtered and
//! paginated lists, categories, recent and featured posts) so the views
//! render the same shapes in either mode.
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{Category, ContactInfo, Pagination, Post, PostPage, SocialMedia};
use crate::query::ListQuery;

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(include_str!("catalog.json")).expect("embedded fallback catalog is valid")
});

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no posts")]
    Empty,
    #[error("duplicate slug '{0}'")]
    DuplicateSlug(String),
    #[error("post {id} has an empty {field}")]
    MissingField { id: i64, field: &'static str },
    #[error("default slug '{0}' is not in the catalog")]
    UnknownDefault(String),
}

#[derive(Deserialize)]
struct RawCatalog {
    default_slug: String,
    posts: Vec<Post>,
    contact_info: ContactInfo,
    social_media: SocialMedia,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Newest first.
    posts: Vec<Post>,
    default_index: usize,
    contact_info: ContactInfo,
    social_media: SocialMedia,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(raw)?;
        if raw.posts.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for post in &raw.posts {
            check_required(post)?;
            if !seen.insert(post.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(post.slug.clone()));
            }
        }

        let mut posts = raw.posts;
        sort_newest_first(&mut posts);
        let default_index = posts
            .iter()
            .position(|p| p.slug == raw.default_slug)
            .ok_or_else(|| CatalogError::UnknownDefault(raw.default_slug.clone()))?;

        Ok(Self {
            posts,
            default_index,
            contact_info: raw.contact_info,
            social_media: raw.social_media,
        })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn default_post(&self) -> &Post {
        &self.posts[self.default_index]
    }

    /// Filter, then paginate.
    pub fn query(&self, query: &ListQuery, per_page: u32) -> PostPage {
        let matching: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| matches_filters(p, query.category.as_deref(), query.search.as_deref()))
            .collect();
        paginate(&matching, query.page, per_page)
    }

    /// Per-category counts aggregated from the posts, sorted by name.
    pub fn categories(&self) -> Vec<Category> {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for post in &self.posts {
            *counts.entry(post.category.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(name, count)| Category {
                name: name.to_string(),
                count,
            })
            .collect()
    }

    pub fn recent(&self, limit: u32) -> Vec<Post> {
        self.posts.iter().take(limit as usize).cloned().collect()
    }

    pub fn featured(&self) -> Vec<Post> {
        self.posts.iter().filter(|p| p.is_featured).cloned().collect()
    }

    /// Exact slug lookup.
    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Slug lookup that always yields a post: unknown slugs get the default.
    pub fn post_by_slug(&self, slug: &str) -> &Post {
        self.find(slug).unwrap_or_else(|| self.default_post())
    }

    pub fn contact_info(&self) -> &ContactInfo {
        &self.contact_info
    }

    pub fn social_media(&self) -> &SocialMedia {
        &self.social_media
    }
}

fn check_required(post: &Post) -> Result<(), CatalogError> {
    let fields: [(&'static str, &str); 7] = [
        ("title", post.title.as_str()),
        ("slug", post.slug.as_str()),
        ("excerpt", post.excerpt.as_str()),
        ("content", post.content.as_str()),
        ("author", post.author.as_str()),
        ("category", post.category.as_str()),
        ("featured_image", post.featured_image.as_str()),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(CatalogError::MissingField { id: post.id, field });
        }
    }
    Ok(())
}

fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.date_posted
            .cmp(&a.date_posted)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Category is a case-insensitive whole-name match. Search is a
/// case-insensitive substring of title, excerpt, content, author or a tag.
pub fn matches_filters(post: &Post, category: Option<&str>, search: Option<&str>) -> bool {
    if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
        if post.category.to_lowercase() != category.to_lowercase() {
            return false;
        }
    }
    if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let needle = needle.to_lowercase();
        let hit = [&post.title, &post.excerpt, &post.content, &post.author]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
            || post.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

/// Slice one 1-based page out of an already filtered, ordered list. A page
/// past the end is empty but still reports the real page count.
pub fn paginate(matching: &[&Post], page: u32, per_page: u32) -> PostPage {
    let pagination = Pagination::new(page, per_page, matching.len() as u32);
    let start = ((pagination.page - 1) as usize).saturating_mul(pagination.per_page as usize);
    let posts = matching
        .iter()
        .skip(start)
        .take(pagination.per_page as usize)
        .map(|p| (*p).clone())
        .collect();
    PostPage { posts, pagination }
}
