//! Circle (source community) REST client.
//!
//! All calls are bearer-authenticated against `CircleConfig::base_url`.
//! Posts are the only paginated listing: pages are requested with
//! `per_page`/`page` until an empty page comes back.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::info;

use crate::config::CircleConfig;
use crate::contract::{Post, SourceCommunity, Space, SpaceGroup};
use crate::http::{ApiClient, ApiError};
use crate::pagination::collect_numbered_pages;

/// Optional narrowing of [`CircleClient::list_posts_filtered`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub space_id: Option<u64>,
    pub space_group_id: Option<u64>,
}

pub struct CircleClient {
    api: ApiClient,
    base_url: String,
    community_id: u64,
    per_page: u32,
}

impl CircleClient {
    pub fn new(config: &CircleConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api_key.clone(), HeaderMap::new())?;
        info!(
            base_url = %config.base_url,
            community_id = config.community_id,
            "Initialised Circle client"
        );
        Ok(Self {
            api,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            community_id: config.community_id,
            per_page: config.per_page,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn community_query(&self) -> Vec<(&'static str, String)> {
        vec![("community_id", self.community_id.to_string())]
    }

    pub async fn me(&self) -> Result<Value, ApiError> {
        self.api.get_json(&self.url("me"), &[]).await
    }

    pub async fn communities(&self) -> Result<Value, ApiError> {
        self.api.get_json(&self.url("communities"), &[]).await
    }

    pub async fn members(&self) -> Result<Value, ApiError> {
        let query = [("per_page", self.per_page.to_string())];
        self.api
            .get_json(&self.url("community_members"), &query)
            .await
    }

    pub async fn course_sections(&self) -> Result<Value, ApiError> {
        self.api
            .get_json(&self.url("course_sections"), &self.community_query())
            .await
    }

    pub async fn course_lessons(&self) -> Result<Value, ApiError> {
        self.api
            .get_json(&self.url("course_lessons"), &self.community_query())
            .await
    }

    pub async fn list_posts_filtered(&self, filter: PostFilter) -> Result<Vec<Post>, ApiError> {
        let url = self.url("posts");
        let mut base_query = self.community_query();
        base_query.push(("per_page", self.per_page.to_string()));
        if let Some(group_id) = filter.space_group_id {
            base_query.push(("space_group_id", group_id.to_string()));
        }
        if let Some(space_id) = filter.space_id {
            base_query.push(("space_id", space_id.to_string()));
        }

        let url = url.as_str();
        let posts = collect_numbered_pages(move |page| {
            let mut query = base_query.clone();
            query.push(("page", page.to_string()));
            async move { self.api.get_json::<Vec<Post>>(url, &query).await }
        })
        .await?;
        info!(count = posts.len(), "Fetched Circle posts");
        Ok(posts)
    }
}

#[async_trait]
impl SourceCommunity for CircleClient {
    async fn list_space_groups(&self) -> Result<Vec<SpaceGroup>, ApiError> {
        let groups: Vec<SpaceGroup> = self
            .api
            .get_json(&self.url("space_groups"), &self.community_query())
            .await?;
        info!(count = groups.len(), "Fetched Circle space groups");
        Ok(groups)
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, ApiError> {
        let spaces: Vec<Space> = self
            .api
            .get_json(&self.url("spaces"), &self.community_query())
            .await?;
        info!(count = spaces.len(), "Fetched Circle spaces");
        Ok(spaces)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.list_posts_filtered(PostFilter::default()).await
    }
}
