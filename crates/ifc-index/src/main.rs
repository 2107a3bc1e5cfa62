// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ifc-index command line
//!
//! Indexes IFC files into a SQLite database and prints quantity summaries
//! as JSON on stdout. Logs go to stderr (`RUST_LOG`, default `info`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ifc_index::{
    prefer_declared, ContainmentPolicy, ExtractOptions, GroupBy, IndexStore, Indexer,
    QuantityType, StoreConfig, SummaryRequest, DEFAULT_BATCH_ROWS, DEFAULT_TAKEOFF_PSET,
};

/// Index IFC models and summarize their quantities
#[derive(Parser, Debug)]
#[command(name = "ifc-index", version, about, long_about = None)]
struct Cli {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://ifc-index.db", global = true)]
    database_url: String,

    /// Connection pool size
    #[arg(long, default_value_t = 5, global = true)]
    max_connections: u32,

    /// Rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_BATCH_ROWS, global = true)]
    batch_rows: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the stored index of a model with the contents of an IFC file
    Index {
        /// Path to the IFC file
        file: PathBuf,

        #[arg(long)]
        model_id: String,

        #[arg(long)]
        project_id: String,

        /// Abort the request after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Which containment wins when an element is contained twice
        #[arg(long, default_value_t = ContainmentPolicy::LastWins)]
        containment: ContainmentPolicy,

        /// Property set whose numeric values are read as quantities
        #[arg(long, default_value = DEFAULT_TAKEOFF_PSET)]
        takeoff_pset: String,
    },

    /// Print summed quantities of an indexed model
    Summary {
        #[arg(long)]
        model_id: String,

        #[arg(long)]
        project_id: String,

        /// type, storey or space
        #[arg(long, default_value_t = GroupBy::Type)]
        group_by: GroupBy,

        /// AREA, LENGTH, VOLUME, COUNT or WEIGHT (repeatable)
        #[arg(long = "quantity-type")]
        quantity_types: Vec<QuantityType>,

        /// Only elements of this IFC class, e.g. IfcWall
        #[arg(long)]
        filter_type: Option<String>,

        /// Only quantities with this name, e.g. NetSideArea
        #[arg(long)]
        filter_name: Option<String>,

        /// Drop take-off rows shadowed by a declared quantity
        #[arg(long)]
        prefer_declared: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = StoreConfig::new(&cli.database_url)
        .with_max_connections(cli.max_connections)
        .with_batch_rows(cli.batch_rows);
    let store = IndexStore::connect(&config)
        .await
        .with_context(|| format!("Failed to open index database {}", cli.database_url))?;
    let store = Arc::new(store);

    let result = run(cli.command, Arc::clone(&store)).await;
    store.close().await;
    result
}

async fn run(command: Command, store: Arc<IndexStore>) -> Result<()> {
    match command {
        Command::Index {
            file,
            model_id,
            project_id,
            timeout_secs,
            containment,
            takeoff_pset,
        } => {
            let buffer = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            log::info!("Read {} ({} bytes)", file.display(), buffer.len());

            let options = ExtractOptions::new()
                .with_containment(containment)
                .with_takeoff_pset(takeoff_pset);
            let indexer = Indexer::new(store).with_options(options);

            let counts = match timeout_secs {
                Some(secs) => {
                    indexer
                        .index_model_with_timeout(buffer, &model_id, &project_id, Duration::from_secs(secs))
                        .await
                }
                None => indexer.index_model(buffer, &model_id, &project_id).await,
            }
            .with_context(|| format!("Failed to index {}", file.display()))?;

            println!("{}", serde_json::to_string_pretty(&counts)?);
        }

        Command::Summary {
            model_id,
            project_id,
            group_by,
            quantity_types,
            filter_type,
            filter_name,
            prefer_declared: reconcile,
        } => {
            let mut request = SummaryRequest::new(model_id, project_id)
                .with_group_by(group_by)
                .with_quantity_types(quantity_types);
            request.filter_type = filter_type;
            request.filter_name = filter_name;

            let indexer = Indexer::new(store);
            let mut rows = indexer
                .quantity_summary(&request)
                .await
                .context("Failed to summarize quantities")?;
            if reconcile {
                rows = prefer_declared(rows);
            }

            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
