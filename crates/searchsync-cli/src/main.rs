//! Searchsync CLI
//!
//! Maintenance and query commands for the index nodes Searchsync writes to.
//! Reindexing needs the host application's record store and is therefore a
//! library call (`SearchCoordinator::reindex_all`), not a command.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod handlers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use searchsync_core::ConnectionConfig;
use searchsync_fts::SearchOptions;

/// Searchsync - keep full-text index nodes in step with relational tables
#[derive(Parser, Debug)]
#[command(name = "searchsync")]
#[command(version, about = "Searchsync index node maintenance tool", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SEARCHSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove every record document from a table's node
    Clear {
        /// Table whose node is cleared
        #[arg(long)]
        table: String,
    },
    /// Search a table's node and print the matching record ids
    Search {
        #[command(flatten)]
        target: Target,

        /// Maximum number of results
        #[arg(long, default_value_t = 100)]
        limit: usize,

        /// Number of leading results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Order expression or shorthand (e.g. "updated_at DESC")
        #[arg(long)]
        order: Option<String>,

        /// Print the matching documents as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count matches on a table's node
    Count {
        #[command(flatten)]
        target: Target,
    },
    /// Print the resolved configuration (password masked)
    Config,
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Table to query
    #[arg(long)]
    table: String,

    /// Attribute filter (`attr OP value`); repeatable
    #[arg(long = "attr")]
    attributes: Vec<String>,

    /// Query words
    query: Vec<String>,
}

impl Target {
    fn query(&self) -> String {
        self.query.join(" ")
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let connection = ConnectionConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Clear { table } => {
            let removed = handlers::cmd_clear(&connection, &table).await?;
            println!("Removed {removed} document(s) from {}", connection.node_name(&table));
        }
        Command::Search {
            target,
            limit,
            offset,
            order,
            json,
        } => {
            let options = SearchOptions {
                limit,
                offset,
                order,
                attributes: target.attributes.clone(),
                ..Default::default()
            };
            let documents =
                handlers::cmd_search(&connection, &target.table, &target.query(), &options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                for document in &documents {
                    println!("{}", handlers::format_document(document));
                }
            }
        }
        Command::Count { target } => {
            let options = SearchOptions {
                attributes: target.attributes.clone(),
                ..Default::default()
            };
            let count =
                handlers::cmd_count(&connection, &target.table, &target.query(), &options).await?;
            println!("{count}");
        }
        Command::Config => {
            print!("{}", handlers::cmd_config(&connection)?);
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
