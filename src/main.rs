//! Rowfarm CLI
//!
//! Command-line interface for bulk-loading, querying and exporting an embedded
//! SQLite store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rowfarm::names::Names;
use rowfarm::utils::{Helpers, Logger};
use rowfarm::{
    BulkGenerator, CooperativeScheduler, Exporter, HarnessConfig, QueryExecutor, Snapshot,
    StoreHandle, StoreSource,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "rowfarm")]
#[command(about = "Bulk-load, query and export an embedded SQLite store", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the store with generated items and subitems
    Generate {
        /// Item count the run is sized for
        #[arg(short, long)]
        items: Option<u64>,

        /// Database file path (in-memory when omitted)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Write a snapshot here once the run completes
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Execute ad-hoc SQL
    Query {
        /// SQL text, one or more statements
        #[arg(short, long)]
        sql: String,

        /// Database file path (in-memory when omitted)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Load an exported image into memory instead of opening a file
        #[arg(long, conflicts_with = "database")]
        snapshot: Option<PathBuf>,
    },

    /// Write the database image to a file
    Export {
        /// Output file path
        #[arg(short, long, default_value = rowfarm::database::SNAPSHOT_FILE_NAME)]
        output: PathBuf,

        /// Database file path (in-memory when omitted)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Load an exported image into memory instead of opening a file
        #[arg(long, conflicts_with = "database")]
        snapshot: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Database file path (in-memory when omitted)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Load an exported image into memory instead of opening a file
        #[arg(long, conflicts_with = "database")]
        snapshot: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

fn store_source(config: &HarnessConfig, snapshot: Option<&Path>) -> Result<StoreSource> {
    match snapshot {
        Some(path) => Ok(Snapshot::load(path)
            .with_context(|| format!("loading snapshot from {}", path.display()))?
            .into_source()),
        None => Ok(config.store_source()),
    }
}

/// Reading commands see nothing in a fresh in-memory store
fn warn_if_empty(source: &StoreSource, command: &str) {
    if source.is_ephemeral() {
        log::warn!(
            "{} runs against an empty in-memory store; pass --database or --snapshot",
            command
        );
    }
}

async fn open_store(source: StoreSource) -> Result<StoreHandle> {
    let description = source.to_string();
    let handle = StoreHandle::new();
    handle
        .initialize(source)
        .await
        .with_context(|| format!("opening {} store", description))?;
    Ok(handle)
}

fn write_snapshot(handle: &StoreHandle, output: &Path) -> Result<()> {
    let snapshot = Exporter::new(handle.clone()).export_snapshot()?;
    snapshot
        .save(output)
        .with_context(|| format!("writing snapshot to {}", output.display()))?;
    println!(
        "Exported {} to {}",
        Helpers::format_bytes(snapshot.len() as u64),
        output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Generate {
            items,
            database,
            export,
        } => {
            if let Some(items) = items {
                config.total_items = items;
            }
            if database.is_some() {
                config.database = database;
            }
            config.validate()?;
            Logger::init_with_level(config.level_filter()?);

            let handle = open_store(config.store_source()).await?;
            let started = Instant::now();
            let last = BulkGenerator::new(handle.clone())
                .with_progress_interval(config.progress_interval)
                .generate(
                    config.total_items,
                    CooperativeScheduler,
                    Names::from_seed(config.seed),
                )?
                .run(|progress| {
                    eprint!("\rGenerated {} rows", Helpers::format_count(progress.rows()))
                })
                .await
                .context("bulk generation failed")?;
            eprintln!();

            let elapsed = started.elapsed();
            println!(
                "Done: {} rows in {} ({:.0} rows/s)",
                Helpers::format_count(last.rows()),
                Helpers::format_duration_from(elapsed),
                Helpers::rows_per_second(last.rows(), elapsed)
            );

            if let Some(output) = export {
                write_snapshot(&handle, &output)?;
            }
        }
        Commands::Query {
            sql,
            database,
            snapshot,
        } => {
            if database.is_some() {
                config.database = database;
            }
            Logger::init_with_level(config.level_filter()?);

            let source = store_source(&config, snapshot.as_deref())?;
            warn_if_empty(&source, "query");
            let handle = open_store(source).await?;
            let result = QueryExecutor::new(handle).execute(&sql)?;
            println!("{}", result);
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Export {
            output,
            database,
            snapshot,
        } => {
            if database.is_some() {
                config.database = database;
            }
            Logger::init_with_level(config.level_filter()?);

            let source = store_source(&config, snapshot.as_deref())?;
            warn_if_empty(&source, "export");
            let handle = open_store(source).await?;
            write_snapshot(&handle, &output)?;
        }
        Commands::Serve {
            addr,
            database,
            snapshot,
        } => {
            if database.is_some() {
                config.database = database;
            }
            config.validate()?;
            Logger::init_with_level(config.level_filter()?);

            let source = store_source(&config, snapshot.as_deref())?;
            serve(&addr, source, config).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "api")]
async fn serve(addr: &str, source: StoreSource, config: HarnessConfig) -> Result<()> {
    let addr = addr
        .parse()
        .with_context(|| format!("invalid listen address: {}", addr))?;
    let handle = open_store(source).await?;
    log::info!("serving {} items per generation run", config.total_items);
    rowfarm::api::ApiServer::new(addr, handle, config)
        .start()
        .await?;
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn serve(_addr: &str, _source: StoreSource, _config: HarnessConfig) -> Result<()> {
    anyhow::bail!("the serve command needs the `api` feature")
}
