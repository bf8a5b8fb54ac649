#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use furnish_content::api::{ApiError, ContentService};
use furnish_content::fallback::{matches_filters, paginate};
use furnish_content::model::{
    Address, Category, ContactInfo, ContactSubmission, EmailAddresses, OpeningHours, PhoneNumbers,
    Post, PostPage, SocialMedia, SocialProfile,
};

pub async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Accept one connection on a local port and answer it with `response`
/// (a raw HTTP/1.1 response). Returns the API base URL to point a client at.
pub async fn serve_once(response: &'static str) -> reqwest::Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    reqwest::Url::parse(&format!("http://{}/api/", addr)).unwrap()
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..head_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    raw.len() >= head_end + 4 + content_length
}

pub fn live_post(id: i64, slug: &str, category: &str, day: u32) -> Post {
    Post {
        id,
        title: format!("Live {}", slug),
        slug: slug.to_string(),
        excerpt: format!("Excerpt for {}", slug),
        content: format!("<p>Body of {}</p>", slug),
        author: "Live Author".into(),
        category: category.to_string(),
        tags: vec!["live".into()],
        featured_image: format!("https://cdn.example/{}.jpg", slug),
        date_posted: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
        view_count: 10,
        read_time: 2,
        is_featured: id % 2 == 0,
    }
}

/// Ten live posts, newest first, across three categories.
pub fn live_posts() -> Vec<Post> {
    let categories = ["Dining", "Lighting", "Dining", "Rugs", "Lighting"];
    (1..=10)
        .rev()
        .map(|i| live_post(i, &format!("live-{}", i), categories[(i as usize) % 5], i as u32))
        .collect()
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "maintenance".into(),
    }
}

/// Content service double serving `live_posts()`. Endpoints named in
/// `failing` return 503; every call is recorded.
#[derive(Clone, Default)]
pub struct ScriptedContent {
    posts: Vec<Post>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
    calls: Arc<Mutex<Vec<String>>>,
    submitted: Arc<Mutex<Vec<ContactSubmission>>>,
    submit_responses: Arc<Mutex<VecDeque<Result<String, ApiError>>>>,
}

impl ScriptedContent {
    pub fn live() -> Self {
        Self {
            posts: live_posts(),
            ..Default::default()
        }
    }

    pub fn failing(endpoints: &[&'static str]) -> Self {
        let svc = Self::live();
        svc.failing
            .try_lock()
            .unwrap()
            .extend(endpoints.iter().copied());
        svc
    }

    pub async fn set_failing(&self, endpoints: &[&'static str]) {
        let mut guard = self.failing.lock().await;
        guard.clear();
        guard.extend(endpoints.iter().copied());
    }

    pub async fn push_submit_response(&self, response: Result<String, ApiError>) {
        self.submit_responses.lock().await.push_back(response);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn submitted(&self) -> Vec<ContactSubmission> {
        self.submitted.lock().await.clone()
    }

    async fn enter(&self, endpoint: &'static str) -> Result<(), ApiError> {
        self.calls.lock().await.push(endpoint.to_string());
        if self.failing.lock().await.contains(endpoint) {
            return Err(unavailable());
        }
        Ok(())
    }
}

pub fn live_contact_info() -> ContactInfo {
    ContactInfo {
        address: Address {
            street: "1 Live Way".into(),
            city: "Portland".into(),
            state: "OR".into(),
            zip: "97201".into(),
            country: "United States".into(),
        },
        phone: PhoneNumbers {
            main: "555-0001".into(),
            support: "555-0002".into(),
        },
        email: EmailAddresses {
            general: "live@example.com".into(),
            support: "help@example.com".into(),
        },
        hours: OpeningHours {
            weekdays: "8-6".into(),
            saturday: "9-5".into(),
            sunday: "closed".into(),
        },
    }
}

#[async_trait]
impl ContentService for ScriptedContent {
    async fn list_posts(
        &self,
        page: u32,
        per_page: u32,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<PostPage, ApiError> {
        self.enter("posts").await?;
        let matching: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| matches_filters(p, category, search))
            .collect();
        Ok(paginate(&matching, page, per_page))
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        self.enter("post").await?;
        self.posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/posts/{}", slug)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.enter("categories").await?;
        let mut names: Vec<&str> = self.posts.iter().map(|p| p.category.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        Ok(names
            .into_iter()
            .map(|name| Category {
                name: name.to_string(),
                count: self.posts.iter().filter(|p| p.category == name).count() as u32,
            })
            .collect())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Post>, ApiError> {
        self.enter("recent").await?;
        Ok(self.posts.iter().take(limit as usize).cloned().collect())
    }

    async fn list_featured(&self) -> Result<Vec<Post>, ApiError> {
        self.enter("featured").await?;
        Ok(self.posts.iter().filter(|p| p.is_featured).cloned().collect())
    }

    async fn contact_info(&self) -> Result<ContactInfo, ApiError> {
        self.enter("contact_info").await?;
        Ok(live_contact_info())
    }

    async fn social_media(&self) -> Result<SocialMedia, ApiError> {
        self.enter("social_media").await?;
        let mut social = SocialMedia::new();
        social.insert(
            "instagram".into(),
            SocialProfile {
                handle: "@live".into(),
                url: "https://instagram.com/live".into(),
                followers: 1,
            },
        );
        Ok(social)
    }

    async fn submit_contact(&self, submission: &ContactSubmission) -> Result<String, ApiError> {
        self.enter("submit").await?;
        let response = self
            .submit_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("Message received".into()));
        if response.is_ok() {
            self.submitted.lock().await.push(submission.clone());
        }
        response
    }
}
