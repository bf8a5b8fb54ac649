//! REST client for the remote content service.
//!
//! Every call is a single request/response. There is no retry and no
//! caching here; callers decide what to substitute when a call fails.
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{Category, ContactInfo, ContactSubmission, Post, PostPage, SocialMedia};

pub mod admin;
pub mod model;

use model::MessageResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base URL: {0}")]
    BaseUrl(String),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
}

impl ApiError {
    /// The backend could not be reached or failed on its side (5xx). Any
    /// other error is an answer about the request itself.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

#[async_trait]
pub trait ContentService: Send + Sync {
    async fn list_posts(
        &self,
        page: u32,
        per_page: u32,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<PostPage, ApiError>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn list_recent(&self, limit: u32) -> Result<Vec<Post>, ApiError>;

    async fn list_featured(&self) -> Result<Vec<Post>, ApiError>;

    async fn contact_info(&self) -> Result<ContactInfo, ApiError>;

    async fn social_media(&self) -> Result<SocialMedia, ApiError>;

    /// Returns the server's acknowledgement message.
    async fn submit_contact(&self, submission: &ContactSubmission) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(cfg.api.base_url.trim())
            .map_err(|e| ApiError::BaseUrl(format!("{}: {}", cfg.api.base_url, e)))?;
        Self::with_base_url(
            base_url,
            &cfg.api.user_agent,
            Duration::from_secs(cfg.api.timeout_secs),
        )
    }

    pub fn with_base_url(
        base_url: Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Segments are percent-encoded,
    /// so a slug can never escape its position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn build_request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        Ok(builder.header("Accept", "application/json"))
    }

    /// Send a request, logging it, and map 404 and other non-success
    /// statuses to typed errors.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "content api request");

        let res = self.http.execute(request).await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            warn!(%method, %url, "content api returned 404");
            return Err(ApiError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%method, %url, %status, "content api error: {}", body);
            return Err(ApiError::Status { status, body });
        }
        Ok(res)
    }

    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let res = self.send(builder).await?;
        let url = res.url().clone();
        let body = res.text().await?;
        debug!(%url, bytes = body.len(), "content api response");
        Ok(serde_json::from_str(&body)?)
    }

    /// Like `execute`, for endpoints whose success body is irrelevant.
    pub(crate) async fn execute_empty(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(), ApiError> {
        self.send(builder).await?;
        Ok(())
    }

    pub fn list_posts_query(
        page: u32,
        per_page: u32,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", page.max(1).to_string()),
            ("per_page", per_page.max(1).to_string()),
        ];
        if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
            query.push(("category", category.to_string()));
        }
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.to_string()));
        }
        query
    }
}

#[async_trait]
impl ContentService for ApiClient {
    async fn list_posts(
        &self,
        page: u32,
        per_page: u32,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<PostPage, ApiError> {
        let query = Self::list_posts_query(page, per_page, category, search);
        let builder = self.build_request(Method::GET, &["posts"], &query)?;
        self.execute(builder).await
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        let builder = self.build_request(Method::GET, &["posts", slug], &[])?;
        self.execute(builder).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let builder = self.build_request(Method::GET, &["categories"], &[])?;
        self.execute(builder).await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Post>, ApiError> {
        let query = [("limit", limit.to_string())];
        let builder = self.build_request(Method::GET, &["posts", "recent"], &query)?;
        self.execute(builder).await
    }

    async fn list_featured(&self) -> Result<Vec<Post>, ApiError> {
        let builder = self.build_request(Method::GET, &["posts", "featured"], &[])?;
        self.execute(builder).await
    }

    async fn contact_info(&self) -> Result<ContactInfo, ApiError> {
        let builder = self.build_request(Method::GET, &["contact", "info"], &[])?;
        self.execute(builder).await
    }

    async fn social_media(&self) -> Result<SocialMedia, ApiError> {
        let builder = self.build_request(Method::GET, &["contact", "social-media"], &[])?;
        self.execute(builder).await
    }

    async fn submit_contact(&self, submission: &ContactSubmission) -> Result<String, ApiError> {
        let builder = self
            .build_request(Method::POST, &["contact", "submit"], &[])?
            .json(submission);
        let resp: MessageResponse = self.execute(builder).await?;
        Ok(resp.message)
    }
}
