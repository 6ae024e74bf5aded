use serde::Deserialize;
use tracing::info;

use crate::contract::ArticleState;

pub const DEFAULT_CIRCLE_BASE_URL: &str = "https://app.circle.so/api/v1";
pub const DEFAULT_INTERCOM_BASE_URL: &str = "https://api.intercom.io";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const DEFAULT_AUTHOR_NAME: &str = "Support technique";

/// Everything a migration run needs, secrets included. Built once by the
/// caller and handed to each client constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    pub circle: CircleConfig,
    pub intercom: IntercomConfig,
    #[serde(default)]
    pub articles: ArticleOptions,
}

impl MigrationConfig {
    pub fn trace_loaded(&self) {
        info!(
            circle_base_url = %self.circle.base_url,
            community_id = self.circle.community_id,
            per_page = self.circle.per_page,
            circle_api_key_set = !self.circle.api_key.is_empty(),
            intercom_base_url = %self.intercom.base_url,
            intercom_api_version = self.intercom.api_version.as_deref().unwrap_or("<default>"),
            intercom_api_key_set = !self.intercom.api_key.is_empty(),
            default_author = %self.articles.default_author,
            "Loaded MigrationConfig"
        );
    }
}

#[derive(Clone, Deserialize)]
pub struct CircleConfig {
    #[serde(default = "default_circle_base_url")]
    pub base_url: String,
    pub community_id: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Clone, Deserialize)]
pub struct IntercomConfig {
    #[serde(default = "default_intercom_base_url")]
    pub base_url: String,
    /// Sent as the `Intercom-Version` header when set.
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub api_key: String,
}

// Manual Debug impls so API keys never end up in logs or panic messages.
impl std::fmt::Debug for CircleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleConfig")
            .field("base_url", &self.base_url)
            .field("community_id", &self.community_id)
            .field("per_page", &self.per_page)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for IntercomConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntercomConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleOptions {
    /// Admin name used when a post's author has no matching admin.
    #[serde(default = "default_author_name")]
    pub default_author: String,
    #[serde(default)]
    pub state: ArticleState,
}

impl Default for ArticleOptions {
    fn default() -> Self {
        Self {
            default_author: default_author_name(),
            state: ArticleState::default(),
        }
    }
}

fn default_circle_base_url() -> String {
    DEFAULT_CIRCLE_BASE_URL.to_string()
}

fn default_intercom_base_url() -> String {
    DEFAULT_INTERCOM_BASE_URL.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_author_name() -> String {
    DEFAULT_AUTHOR_NAME.to_string()
}
