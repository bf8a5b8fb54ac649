//! Admin CRUD for posts. Every call requires an admin `SessionContext`;
//! the gate is checked before any request is built.
use reqwest::Method;
use tracing::info;

use super::{ApiClient, ApiError};
use crate::model::{Post, PostDraft};
use crate::session::SessionContext;

impl ApiClient {
    pub fn build_admin_request(
        &self,
        session: &SessionContext,
        method: Method,
        segments: &[&str],
        body: Option<&PostDraft>,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = session.require_admin()?;
        let mut builder = self
            .build_request(method, segments, &[])?
            .bearer_auth(token);
        if let Some(draft) = body {
            builder = builder.json(draft);
        }
        Ok(builder)
    }

    pub async fn admin_list_posts(&self, session: &SessionContext) -> Result<Vec<Post>, ApiError> {
        let builder = self.build_admin_request(session, Method::GET, &["admin", "posts"], None)?;
        self.execute(builder).await
    }

    pub async fn admin_create_post(
        &self,
        session: &SessionContext,
        draft: &PostDraft,
    ) -> Result<Post, ApiError> {
        let builder =
            self.build_admin_request(session, Method::POST, &["admin", "posts"], Some(draft))?;
        let post: Post = self.execute(builder).await?;
        info!(id = post.id, slug = %post.slug, "created post");
        Ok(post)
    }

    pub async fn admin_update_post(
        &self,
        session: &SessionContext,
        id: i64,
        draft: &PostDraft,
    ) -> Result<Post, ApiError> {
        let id = id.to_string();
        let builder =
            self.build_admin_request(session, Method::PUT, &["admin", "posts", &id], Some(draft))?;
        let post: Post = self.execute(builder).await?;
        info!(id = post.id, slug = %post.slug, "updated post");
        Ok(post)
    }

    pub async fn admin_delete_post(&self, session: &SessionContext, id: i64) -> Result<(), ApiError> {
        let id_str = id.to_string();
        let builder =
            self.build_admin_request(session, Method::DELETE, &["admin", "posts", &id_str], None)?;
        self.execute_empty(builder).await?;
        info!(id, "deleted post");
        Ok(())
    }
}
