//! Intercom (destination help-center) REST client.
//!
//! Listings of collections and articles are paginated through the `next`
//! link of the response's `pages` object. Names and titles are HTML-decoded
//! on the way in so that they compare equal to the source names.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::IntercomConfig;
use crate::contract::{Admin, Article, Collection, HelpCenter, NewArticle, NewCollection};
use crate::html;
use crate::http::{ApiClient, ApiError};
use crate::pagination::{collect_linked_pages, LinkedPage};

const VERSION_HEADER: &str = "intercom-version";

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Deserialize)]
struct Pages {
    // Either an absolute URL or, on cursor-based endpoints, an object.
    #[serde(default)]
    next: Option<Value>,
}

impl<T> ListResponse<T> {
    /// Resolve `pages.next` against `endpoint`. Cursor objects carry a
    /// `starting_after` token that is sent back as a query parameter.
    fn into_page(self, endpoint: &str) -> LinkedPage<T> {
        let next = self
            .pages
            .and_then(|p| p.next)
            .and_then(|next| next_link(next, endpoint));
        LinkedPage {
            items: self.data,
            next,
        }
    }
}

fn next_link(next: Value, endpoint: &str) -> Option<String> {
    match next {
        Value::Null => None,
        Value::String(url) => Some(url),
        Value::Object(cursor) => match cursor.get("starting_after").and_then(Value::as_str) {
            Some(token) => match Url::parse_with_params(endpoint, [("starting_after", token)]) {
                Ok(url) => Some(url.into()),
                Err(e) => {
                    warn!(endpoint, error = %e, "Cannot build next page URL; stopping pagination");
                    None
                }
            },
            None => {
                warn!(endpoint, next = ?cursor, "Pagination cursor has no starting_after; stopping");
                None
            }
        },
        other => {
            warn!(endpoint, next = %other, "Unrecognised next page link; stopping pagination");
            None
        }
    }
}

#[derive(Deserialize)]
struct AdminList {
    #[serde(default)]
    admins: Vec<Admin>,
}

pub struct IntercomClient {
    api: ApiClient,
    base_url: String,
}

impl IntercomClient {
    pub fn new(config: &IntercomConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(version) = &config.api_version {
            let value = HeaderValue::from_str(version).map_err(|source| {
                error!(error = %source, api_version = %version, "Invalid Intercom API version");
                ApiError::InvalidHeader {
                    name: VERSION_HEADER,
                    value: version.clone(),
                    source,
                }
            })?;
            headers.insert(HeaderName::from_static(VERSION_HEADER), value);
        }
        let api = ApiClient::new(config.api_key.clone(), headers)?;
        info!(
            base_url = %config.base_url,
            api_version = config.api_version.as_deref().unwrap_or("<default>"),
            "Initialised Intercom client"
        );
        Ok(Self {
            api,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn list_all<T>(&self, path: &str) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let endpoint = self.url(path);
        let endpoint = endpoint.as_str();
        collect_linked_pages(endpoint.to_string(), move |url| async move {
            let page: ListResponse<T> = self.api.get_json(&url, &[]).await?;
            Ok(page.into_page(endpoint))
        })
        .await
    }

    pub async fn teams(&self) -> Result<Value, ApiError> {
        self.api.get_json(&self.url("teams"), &[]).await
    }

    pub async fn help_centers(&self) -> Result<Value, ApiError> {
        self.api
            .get_json(&self.url("help_center/help_centers"), &[])
            .await
    }
}

#[async_trait]
impl HelpCenter for IntercomClient {
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let mut collections: Vec<Collection> = self.list_all("help_center/collections").await?;
        for collection in &mut collections {
            collection.name = html::unescape(&collection.name);
        }
        info!(count = collections.len(), "Fetched Intercom collections");
        Ok(collections)
    }

    async fn create_collection(&self, req: NewCollection) -> Result<Collection, ApiError> {
        info!(name = %req.name, parent_id = ?req.parent_id, "Creating Intercom collection");
        let mut created: Collection = self
            .api
            .post_json(&self.url("help_center/collections"), &req)
            .await?;
        created.name = html::unescape(&created.name);
        info!(collection_id = %created.id, name = %created.name, "Created Intercom collection");
        Ok(created)
    }

    async fn delete_collection(&self, collection_id: String) -> Result<(), ApiError> {
        info!(collection_id = %collection_id, "Deleting Intercom collection");
        self.api
            .delete(&self.url(&format!("help_center/collections/{collection_id}")))
            .await
    }

    async fn list_articles(&self) -> Result<Vec<Article>, ApiError> {
        let mut articles: Vec<Article> = self.list_all("articles").await?;
        for article in &mut articles {
            article.title = html::unescape(&article.title);
        }
        info!(count = articles.len(), "Fetched Intercom articles");
        Ok(articles)
    }

    async fn create_article(&self, req: NewArticle) -> Result<Article, ApiError> {
        info!(title = %req.title, parent_id = ?req.parent_id, author_id = %req.author_id, "Creating Intercom article");
        let mut created: Article = self.api.post_json(&self.url("articles"), &req).await?;
        created.title = html::unescape(&created.title);
        info!(article_id = %created.id, "Created Intercom article");
        Ok(created)
    }

    async fn delete_article(&self, article_id: String) -> Result<(), ApiError> {
        info!(article_id = %article_id, "Deleting Intercom article");
        self.api
            .delete(&self.url(&format!("articles/{article_id}")))
            .await
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, ApiError> {
        let list: AdminList = self.api.get_json(&self.url("admins"), &[]).await?;
        info!(count = list.admins.len(), "Fetched Intercom admins");
        Ok(list.admins)
    }
}
