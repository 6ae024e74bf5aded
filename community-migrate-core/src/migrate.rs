//! Migration drivers: collections, articles, and the destructive purges.
//!
//! # Flow
//! 1. [`migrate_collections`] reads space groups, spaces and existing
//!    collections, then reconciles them (see [`crate::lookup`]).
//! 2. [`migrate_articles`] creates one article per source post, placing it
//!    in the collection mirrored from the post's space and attributing it to
//!    the admin with the author's name, or to the default author.
//! 3. [`migrate_all`] runs both in one pass.
//!
//! Everything is sequential. Article creation does not stop at the first
//! failing post: each post yields its own [`ArticleOutcome`]. Fetch failures
//! and collection failures abort the run.
//!
//! [`purge_collections`] and [`purge_articles`] wipe the destination and
//! refuse to start unless explicitly confirmed.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ArticleOptions;
use crate::contract::{Admin, HelpCenter, NewArticle, SourceCommunity};
use crate::http::ApiError;
use crate::lookup::{reconcile, LookupError, LookupTable, ReconcileError, ResolvedLookup};

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("`{operation}` deletes destination content; it requires explicit confirmation")]
    ConfirmationRequired { operation: &'static str },
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("default author {name:?} is not a help-center admin")]
    UnknownDefaultAuthor { name: String },
    #[error("failed to delete {what} {id}: {source}")]
    Delete {
        what: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },
}

fn fetch_error(what: &'static str) -> impl FnOnce(ApiError) -> MigrateError {
    move |source| {
        error!(what, error = %source, "Fetch failed");
        MigrateError::Fetch { what, source }
    }
}

/// Admin name to admin id, with a fallback for unknown names.
#[derive(Debug, Clone)]
pub struct AuthorDirectory {
    by_name: HashMap<String, String>,
    default_id: String,
}

impl AuthorDirectory {
    pub fn from_admins(admins: &[Admin], default_author: &str) -> Result<Self, MigrateError> {
        let by_name: HashMap<String, String> = admins
            .iter()
            .map(|admin| (admin.name.clone(), admin.id.clone()))
            .collect();
        let default_id = by_name
            .get(default_author)
            .cloned()
            .ok_or_else(|| MigrateError::UnknownDefaultAuthor {
                name: default_author.to_string(),
            })?;
        Ok(Self {
            by_name,
            default_id,
        })
    }

    pub fn resolve(&self, author_name: Option<&str>) -> &str {
        author_name
            .and_then(|name| self.by_name.get(name))
            .map(String::as_str)
            .unwrap_or(&self.default_id)
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArticleStatus {
    Created { article_id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleOutcome {
    pub post_id: u64,
    pub title: String,
    pub collection_id: Option<String>,
    pub author_id: String,
    pub status: ArticleStatus,
}

/// One outcome per source post, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleReport {
    pub outcomes: Vec<ArticleOutcome>,
}

impl ArticleReport {
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArticleStatus::Created { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.created()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub collections: ResolvedLookup,
    pub articles: ArticleReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
}

pub async fn migrate_collections<S, H>(
    source: &S,
    destination: &H,
) -> Result<ResolvedLookup, MigrateError>
where
    S: SourceCommunity + ?Sized,
    H: HelpCenter + ?Sized,
{
    info!("[MIGRATE] Reading source hierarchy");
    let groups = source
        .list_space_groups()
        .await
        .map_err(fetch_error("space groups"))?;
    let spaces = source
        .list_spaces()
        .await
        .map_err(fetch_error("spaces"))?;
    let table = LookupTable::build(&groups, &spaces)?;
    info!(
        groups = groups.len(),
        spaces = spaces.len(),
        rows = table.len(),
        "[MIGRATE] Built lookup table"
    );

    let existing = destination
        .list_collections()
        .await
        .map_err(fetch_error("collections"))?;
    let resolved = reconcile(table, &existing, destination).await?;
    info!(
        created = resolved.created(),
        reused = resolved.reused(),
        "[MIGRATE] Collections migrated"
    );
    Ok(resolved)
}

pub async fn migrate_articles<S, H>(
    source: &S,
    destination: &H,
    lookup: &ResolvedLookup,
    options: &ArticleOptions,
) -> Result<ArticleReport, MigrateError>
where
    S: SourceCommunity + ?Sized,
    H: HelpCenter + ?Sized,
{
    let admins = destination
        .list_admins()
        .await
        .map_err(fetch_error("admins"))?;
    let authors = AuthorDirectory::from_admins(&admins, &options.default_author)?;
    let posts = source.list_posts().await.map_err(fetch_error("posts"))?;
    info!(posts = posts.len(), admins = admins.len(), "[MIGRATE] Migrating articles");

    let mut report = ArticleReport::default();
    for post in posts {
        let author_id = authors.resolve(post.user_name.as_deref()).to_string();
        let collection_id = post
            .space_name
            .as_deref()
            .and_then(|space| lookup.destination_id(space))
            .map(str::to_owned);

        let status = match &collection_id {
            None => {
                warn!(post_id = post.id, space = ?post.space_name, "[MIGRATE] No collection for post's space");
                ArticleStatus::Failed {
                    reason: format!(
                        "no collection mirrors space {:?}",
                        post.space_name.as_deref().unwrap_or("<none>")
                    ),
                }
            }
            Some(parent_id) => {
                let req = NewArticle {
                    title: post.name.clone(),
                    author_id: author_id.clone(),
                    body: post.body_html().map(str::to_owned),
                    parent_id: Some(parent_id.clone()),
                    state: options.state,
                };
                match destination.create_article(req).await {
                    Ok(article) => {
                        info!(post_id = post.id, article_id = %article.id, "[MIGRATE] Article created");
                        ArticleStatus::Created {
                            article_id: article.id,
                        }
                    }
                    Err(e) => {
                        error!(post_id = post.id, error = %e, "[MIGRATE] Article creation failed");
                        ArticleStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        report.outcomes.push(ArticleOutcome {
            post_id: post.id,
            title: post.name,
            collection_id,
            author_id,
            status,
        });
    }

    info!(
        created = report.created(),
        failed = report.failed(),
        "[MIGRATE] Articles migrated"
    );
    Ok(report)
}

pub async fn migrate_all<S, H>(
    source: &S,
    destination: &H,
    options: &ArticleOptions,
) -> Result<MigrationReport, MigrateError>
where
    S: SourceCommunity + ?Sized,
    H: HelpCenter + ?Sized,
{
    let collections = migrate_collections(source, destination).await?;
    let articles = migrate_articles(source, destination, &collections, options).await?;
    Ok(MigrationReport {
        collections,
        articles,
    })
}

/// Delete every root collection; nested collections go with their parent.
pub async fn purge_collections<H>(
    destination: &H,
    confirmed: bool,
) -> Result<PurgeReport, MigrateError>
where
    H: HelpCenter + ?Sized,
{
    if !confirmed {
        return Err(MigrateError::ConfirmationRequired {
            operation: "purge-collections",
        });
    }
    let roots: Vec<String> = destination
        .list_collections()
        .await
        .map_err(fetch_error("collections"))?
        .into_iter()
        .filter(|c| c.parent_id.is_none())
        .map(|c| c.id)
        .collect();
    info!(count = roots.len(), "[PURGE] Deleting root collections");

    let mut report = PurgeReport::default();
    for id in roots {
        destination
            .delete_collection(id.clone())
            .await
            .map_err(|source| MigrateError::Delete {
                what: "collection",
                id: id.clone(),
                source,
            })?;
        report.deleted.push(id);
    }
    Ok(report)
}

pub async fn purge_articles<H>(destination: &H, confirmed: bool) -> Result<PurgeReport, MigrateError>
where
    H: HelpCenter + ?Sized,
{
    if !confirmed {
        return Err(MigrateError::ConfirmationRequired {
            operation: "purge-articles",
        });
    }
    let ids: Vec<String> = destination
        .list_articles()
        .await
        .map_err(fetch_error("articles"))?
        .into_iter()
        .map(|a| a.id)
        .collect();
    info!(count = ids.len(), "[PURGE] Deleting articles");

    let mut report = PurgeReport::default();
    for id in ids {
        destination
            .delete_article(id.clone())
            .await
            .map_err(|source| MigrateError::Delete {
                what: "article",
                id: id.clone(),
                source,
            })?;
        report.deleted.push(id);
    }
    Ok(report)
}
