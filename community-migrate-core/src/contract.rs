//! # contract: platform-facing data types and client traits
//!
//! Two traits describe the only platform operations the migration needs:
//! [`SourceCommunity`] for the community platform being read, and
//! [`HelpCenter`] for the help-center being written. Real clients live in
//! [`crate::circle`] and [`crate::intercom`]; tests use the `mockall`
//! generated `MockSourceCommunity` / `MockHelpCenter`.
//!
//! Source ids are integers, destination ids are strings, matching what each
//! API returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::ApiError;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Top-level source node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceGroup {
    pub id: u64,
    pub name: String,
}

/// Second-level source node, child of a [`SpaceGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub space_group_id: Option<u64>,
    #[serde(default)]
    pub space_group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostBody {
    #[serde(default)]
    pub body: Option<String>,
}

/// A source post. `name` is the title; `space_name` names its parent space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub body: Option<PostBody>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub space_id: Option<u64>,
}

impl Post {
    pub fn body_html(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.body.as_deref())
    }
}

/// Destination container node, optionally nested under a parent collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleState {
    #[default]
    Published,
    Draft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub state: Option<ArticleState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub author_id: String,
    pub body: Option<String>,
    pub parent_id: Option<String>,
    pub state: ArticleState,
}

/// Help-center admin; articles are authored by admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Read side of the migration.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SourceCommunity: Send + Sync {
    async fn list_space_groups(&self) -> Result<Vec<SpaceGroup>, ApiError>;

    async fn list_spaces(&self) -> Result<Vec<Space>, ApiError>;

    /// Every post of the community, across all pages.
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;
}

/// Write side of the migration.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HelpCenter: Send + Sync {
    /// Every collection, names HTML-decoded.
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn create_collection(&self, req: NewCollection) -> Result<Collection, ApiError>;

    async fn delete_collection(&self, collection_id: String) -> Result<(), ApiError>;

    /// Every article, titles HTML-decoded.
    async fn list_articles(&self) -> Result<Vec<Article>, ApiError>;

    async fn create_article(&self, req: NewArticle) -> Result<Article, ApiError>;

    async fn delete_article(&self, article_id: String) -> Result<(), ApiError>;

    async fn list_admins(&self) -> Result<Vec<Admin>, ApiError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Str(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
        }
    }
}

// Intercom returns some ids as strings and others as numbers depending on the
// endpoint and API version.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}
