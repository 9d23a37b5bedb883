//! CLI adapter.
//!
//! Command-line interface over the same [`Services`] container the HTTP
//! API runs on. This module is parallel to `api/` - both depend on
//! `core/` but not on each other.

pub mod output;

use crate::core::error::Result;
use crate::core::services::Services;
use crate::core::types::{FilterParams, Scope, SearchOptions};
use clap::{Args, Parser, Subcommand};

/// codesift - faceted source-code search across git repositories
#[derive(Parser, Debug)]
#[command(name = "codesift")]
#[command(version)]
#[command(about = "Faceted source-code search across organizations, projects, repositories and refs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Import a repository's refs into the index
    Index(IndexArgs),

    /// Search the index
    Search(SearchArgs),

    /// Remove refs from the index
    DeleteRefs(DeleteRefsArgs),
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[arg(long)]
    pub organization: String,
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub repository: String,
    /// Refs to import; all branches and tags when omitted
    #[arg(long = "ref")]
    pub refs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query string
    pub query: String,

    /// Restrict to file extensions (repeatable, e.g. --ext .go)
    #[arg(long = "ext")]
    pub ext: Vec<String>,

    #[arg(long)]
    pub organization: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub repository: Option<String>,

    /// Restrict to refs (repeatable)
    #[arg(long = "ref")]
    pub refs: Vec<String>,

    /// First hit to return
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// Number of hits to return
    #[arg(long)]
    pub size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DeleteRefsArgs {
    #[arg(long)]
    pub organization: String,
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub repository: String,
    /// Refs to remove (repeatable, required)
    #[arg(long = "ref", required = true)]
    pub refs: Vec<String>,
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli, config: crate::core::config::Config) -> Result<()> {
    config.log_config();
    let services = Services::new(config)?;

    match cli.command {
        Commands::Serve => serve(services).await,
        Commands::Index(args) => {
            let scope = Scope::new(args.organization, args.project, args.repository);
            let stats = if args.refs.is_empty() {
                services.importer.import_repository(&scope)?
            } else {
                let mut stats = crate::core::indexer::ImportStats::default();
                for ref_name in &args.refs {
                    let (indexed, skipped) = services.importer.import_ref(&scope, ref_name)?;
                    stats.refs_imported += 1;
                    stats.files_indexed += indexed;
                    stats.files_skipped += skipped;
                }
                stats
            };
            output::print_import_stats(&stats, cli.format);
            Ok(())
        }
        Commands::Search(args) => {
            let filter = FilterParams {
                ext: args.ext,
                organization: args.organization,
                project: args.project,
                repository: args.repository,
                refs: args.refs,
            };
            let opts = SearchOptions {
                from: args.from,
                size: args.size,
                deadline: None,
            };
            let result = services.query.search_opts(&args.query, &filter, &opts)?;
            output::print_search_result(&result, cli.format);
            Ok(())
        }
        Commands::DeleteRefs(args) => {
            services.indexer.delete_index_by_refs(
                &args.organization,
                &args.project,
                &args.repository,
                &args.refs,
            )?;
            if cli.format == OutputFormat::Human {
                println!("deleted refs {:?}", args.refs);
            }
            Ok(())
        }
    }
}

async fn serve(services: Services) -> Result<()> {
    let addr = format!(
        "{}:{}",
        services.config.server.host, services.config.server.port
    );
    let app = crate::api::router(services);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(crate::core::error::SiftError::Io)?;
    Ok(())
}
