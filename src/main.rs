//! # memex CLI
//!
//! The `memex` binary indexes, searches, and summarizes a vault of markdown
//! memories.
//!
//! ## Usage
//!
//! ```bash
//! memex --config ./config/memex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `memex init` | Create the SQLite index and run schema migrations |
//! | `memex sync` | Index the vault (incremental unless `--full`) |
//! | `memex search "<query>"` | Ranked index search, or `--mode scan` for a raw file scan |
//! | `memex get <id>` | Print one indexed memory |
//! | `memex stats` | Index totals and rating distribution |
//! | `memex synthesize` | Weekly pattern report |
//! | `memex state ...` | Work-continuity state |
//!
//! Diagnostics go to stderr; set `MEMEX_LOG=debug` for more detail.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use memex::ingest::SyncOptions;
use memex::progress::ProgressMode;
use memex::search::SearchFilters;
use memex::state::{LastSession, StateAction};
use memex::{config, get, ingest, migrate, search, state, stats, synthesis};

/// memex: index, search, and synthesize a personal knowledge vault.
#[derive(Parser)]
#[command(name = "memex", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/memex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the index schema. Safe to run repeatedly.
    Init,

    /// Index the vault.
    ///
    /// Incremental by file modification time unless `--full`. Records whose
    /// file has been deleted are pruned.
    Sync {
        /// Ignore checkpoint and re-read every file.
        #[arg(long)]
        full: bool,

        /// Count files without writing to the index.
        #[arg(long)]
        dry_run: bool,

        /// Only files modified on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Only files modified on or before this date (YYYY-MM-DD).
        #[arg(long)]
        until: Option<String>,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Progress on stderr: off, human, or json.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Search memories.
    ///
    /// `index` (default) ranks against the full-text index. `scan` reads the
    /// vault directly and treats QUERY as a regular expression.
    Search {
        query: String,

        /// Search mode: index or scan.
        #[arg(long, default_value = "index")]
        mode: String,

        /// Restrict to one category (e.g. system-learning).
        #[arg(long)]
        category: Option<String>,

        /// Only memories dated on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        #[arg(long)]
        limit: Option<i64>,

        /// Match QUERY as literal text in scan mode.
        #[arg(long)]
        literal: bool,
    },

    /// Print one indexed memory by identity.
    Get { id: String },

    /// Show index statistics.
    Stats,

    /// Produce the weekly pattern report.
    Synthesize {
        /// Any day in the target week (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Categories to include. Defaults to the learning categories.
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Print the report instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Read or update work-continuity state.
    State {
        #[command(subcommand)]
        action: StateCommand,
    },
}

#[derive(Subcommand)]
enum StateCommand {
    Show,
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Record the summary of the session just finished.
    Session {
        summary: String,

        /// Repeat for each next step.
        #[arg(long = "next")]
        next_steps: Vec<String>,

        /// Repeat for each modified file.
        #[arg(long = "file")]
        files: Vec<String>,

        /// Session date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    Add { name: String },
    Remove { name: String },
}

#[derive(Subcommand)]
enum ItemAction {
    Add {
        description: String,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        context: Option<String>,
    },
    /// Resolve the open item at INDEX (as listed by `state show`).
    Resolve { index: usize },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MEMEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync {
            full,
            dry_run,
            since,
            until,
            limit,
            progress,
        } => {
            let mode = ProgressMode::from_flag(progress.as_deref())?;
            let opts = SyncOptions {
                full,
                dry_run,
                since,
                until,
                limit,
            };
            ingest::run_sync(&cfg, opts, mode.reporter().as_ref()).await?;
        }
        Commands::Search {
            query,
            mode,
            category,
            since,
            limit,
            literal,
        } => {
            let filters = SearchFilters::parse(category.as_deref(), since.as_deref(), limit)?;
            search::run_search(&cfg, &query, &mode, filters, literal).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Synthesize {
            date,
            categories,
            dry_run,
        } => {
            synthesis::run_synthesize(&cfg, date, categories, dry_run)?;
        }
        Commands::State { action } => {
            let action = match action {
                StateCommand::Show => StateAction::Show,
                StateCommand::Project { action } => match action {
                    ProjectAction::Add { name } => StateAction::AddProject(name),
                    ProjectAction::Remove { name } => StateAction::RemoveProject(name),
                },
                StateCommand::Item { action } => match action {
                    ItemAction::Add {
                        description,
                        priority,
                        context,
                    } => StateAction::AddItem {
                        description,
                        priority,
                        context,
                    },
                    ItemAction::Resolve { index } => StateAction::ResolveItem(index),
                },
                StateCommand::Session {
                    summary,
                    next_steps,
                    files,
                    date,
                } => {
                    let date = match date {
                        Some(d) => state::parse_session_date(&d)?,
                        None => chrono::Utc::now().date_naive().to_string(),
                    };
                    StateAction::Session(LastSession {
                        date,
                        summary,
                        next_steps,
                        files_modified: if files.is_empty() { None } else { Some(files) },
                    })
                }
            };
            state::run_state(&cfg, action)?;
        }
    }

    Ok(())
}
