/// CLI glue for community-migrate: argument parsing, client construction,
/// and JSON output. Migration logic lives in `community-migrate-core`.
///
/// Reports and `show` output go to stdout as pretty JSON; logs go to stderr.
use crate::load_config::load_config;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use community_migrate_core::circle::{CircleClient, PostFilter};
use community_migrate_core::contract::{HelpCenter, SourceCommunity};
use community_migrate_core::intercom::IntercomClient;
use community_migrate_core::migrate::{
    migrate_all, migrate_collections, purge_articles, purge_collections,
};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yml";

#[derive(Parser)]
#[clap(
    name = "community-migrate",
    version,
    about = "Mirror Circle space groups, spaces and posts into Intercom help-center collections and articles"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create (or reuse) one collection per space group and space
    Collections,
    /// Migrate collections, then every post as an article
    Migrate,
    /// Delete every help-center collection
    PurgeCollections {
        /// Confirm the deletion
        #[clap(long)]
        yes: bool,
    },
    /// Delete every help-center article
    PurgeArticles {
        /// Confirm the deletion
        #[clap(long)]
        yes: bool,
    },
    /// Print platform data as JSON
    Show {
        #[clap(value_enum)]
        resource: Resource,
        /// Only posts from this Circle space (`posts` only)
        #[clap(long)]
        space_id: Option<u64>,
        /// Only posts from this Circle space group (`posts` only)
        #[clap(long)]
        space_group_id: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Me,
    Communities,
    SpaceGroups,
    Spaces,
    Posts,
    Members,
    CourseSections,
    CourseLessons,
    Collections,
    Articles,
    Admins,
    Teams,
    HelpCenters,
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;
    let circle = CircleClient::new(&config.circle)?;
    let intercom = IntercomClient::new(&config.intercom)?;

    match cli.command {
        Commands::Collections => {
            tracing::info!(command = "collections", "Starting collection migration");
            let lookup = migrate_collections(&circle, &intercom).await?;
            emit(&lookup)
        }
        Commands::Migrate => {
            tracing::info!(command = "migrate", "Starting full migration");
            let report = migrate_all(&circle, &intercom, &config.articles).await?;
            emit(&report)?;
            let failed = report.articles.failed();
            if failed > 0 {
                tracing::error!(command = "migrate", failed, "Some articles were not migrated");
                bail!("{failed} of {} posts were not migrated", report.articles.outcomes.len());
            }
            Ok(())
        }
        Commands::PurgeCollections { yes } => {
            let report = purge_collections(&intercom, yes).await?;
            tracing::info!(command = "purge-collections", deleted = report.deleted.len(), "Purge complete");
            emit(&report)
        }
        Commands::PurgeArticles { yes } => {
            let report = purge_articles(&intercom, yes).await?;
            tracing::info!(command = "purge-articles", deleted = report.deleted.len(), "Purge complete");
            emit(&report)
        }
        Commands::Show {
            resource,
            space_id,
            space_group_id,
        } => {
            let filter = PostFilter {
                space_id,
                space_group_id,
            };
            if resource != Resource::Posts && (space_id.is_some() || space_group_id.is_some()) {
                bail!("--space-id and --space-group-id only apply to `show posts`");
            }
            show(resource, filter, &circle, &intercom).await
        }
    }
}

async fn show(
    resource: Resource,
    filter: PostFilter,
    circle: &CircleClient,
    intercom: &IntercomClient,
) -> Result<()> {
    tracing::info!(command = "show", ?resource, ?filter, "Fetching resource");
    match resource {
        Resource::Me => emit(&circle.me().await?),
        Resource::Communities => emit(&circle.communities().await?),
        Resource::SpaceGroups => emit(&circle.list_space_groups().await?),
        Resource::Spaces => emit(&circle.list_spaces().await?),
        Resource::Posts => emit(&circle.list_posts_filtered(filter).await?),
        Resource::Members => emit(&circle.members().await?),
        Resource::CourseSections => emit(&circle.course_sections().await?),
        Resource::CourseLessons => emit(&circle.course_lessons().await?),
        Resource::Collections => emit(&intercom.list_collections().await?),
        Resource::Articles => emit(&intercom.list_articles().await?),
        Resource::Admins => emit(&intercom.list_admins().await?),
        Resource::Teams => emit(&intercom.teams().await?),
        Resource::HelpCenters => emit(&intercom.help_centers().await?),
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
