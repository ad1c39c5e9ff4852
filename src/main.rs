// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use record_lookup::config::{apply_env_overrides, load_config_with_env, LoggingConfig, ZenohConfig};
use record_lookup::storage::{build_index, BackendSelector, StorageArtifacts};
use record_lookup::{LookupConfig, LookupService, QueryInterface};

/// Record Lookup - serve read-only record queries over Zenoh
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Dataset directory (overrides config file)
    #[arg(short, long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select the dataset backend and serve queries until Ctrl+C
    Serve,

    /// Build an SQLite indexed store from the batch files in the data directory
    BuildIndex {
        /// Output path (defaults to the configured index file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        load_config_with_env(&args.config)?
    } else {
        let mut config = LookupConfig::default();
        apply_env_overrides(&mut config);
        config
    };

    if let Some(data_dir) = args.data_dir {
        config.dataset.data_dir = data_dir;
    }

    init_tracing(&config.logging)?;

    info!("Starting Record Lookup");
    if args.config.exists() {
        info!("Loaded configuration from: {:?}", args.config);
    } else {
        info!("No configuration at {:?}, using defaults", args.config);
    }
    info!("Data directory: {}", config.dataset.data_dir);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::BuildIndex { output } => {
            let output = output.unwrap_or_else(|| config.dataset.index_path());
            index(config, output).await
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish())?,
        _ => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn zenoh_config(settings: &ZenohConfig) -> Result<zenoh::Config> {
    let mut zenoh_config = zenoh::Config::default();

    zenoh_config
        .insert_json5("mode", &serde_json::to_string(&settings.mode)?)
        .map_err(|e| anyhow!("Invalid zenoh mode: {}", e))?;

    if let Some(connect) = &settings.connect {
        zenoh_config
            .insert_json5("connect/endpoints", &serde_json::to_string(&connect.endpoints)?)
            .map_err(|e| anyhow!("Invalid connect endpoints: {}", e))?;
    }

    if let Some(listen) = &settings.listen {
        zenoh_config
            .insert_json5("listen/endpoints", &serde_json::to_string(&listen.endpoints)?)
            .map_err(|e| anyhow!("Invalid listen endpoints: {}", e))?;
    }

    Ok(zenoh_config)
}

async fn serve(config: LookupConfig) -> Result<()> {
    // Selected once; fixed for the process lifetime
    let (dataset, source) = BackendSelector::create(&config.dataset)?;
    info!("Storage backend initialized: {}", source.backend_type());

    if !source.health_check().await? {
        tracing::warn!("Storage backend health check failed; continuing");
    }

    let service = Arc::new(LookupService::new(source, dataset, config.query.clone()));

    let session = zenoh::open(zenoh_config(&config.zenoh)?)
        .await
        .map_err(|e| anyhow!("Failed to open Zenoh session: {}", e))?;
    info!("Zenoh session opened ({} mode)", config.zenoh.mode);

    let query_interface = QueryInterface::new(session.clone(), service);

    tokio::select! {
        result = query_interface.run() => {
            if let Err(e) = result {
                tracing::error!("Query interface error: {}", e);
            }
            info!("Query interface stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    session
        .close()
        .await
        .map_err(|e| anyhow!("Failed to close Zenoh session: {}", e))?;
    info!("Record Lookup shut down successfully");

    Ok(())
}

async fn index(config: LookupConfig, output: PathBuf) -> Result<()> {
    let artifacts = StorageArtifacts::discover(&config.dataset)?;
    let Some(batches) = BackendSelector::select_batches(&artifacts).batch_stream() else {
        bail!("No batch artifacts to index");
    };

    if batches.batch_count() == 0 {
        bail!("No batch files found in {}", config.dataset.data_dir);
    }

    let stats = build_index(&output, &batches).await?;
    info!(
        "Indexed {} records into {} ({} duplicates, {} skipped, {} inexact)",
        stats.inserted,
        output.display(),
        stats.duplicates,
        stats.skipped,
        stats.inexact
    );

    Ok(())
}
