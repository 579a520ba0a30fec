use anyhow::{Context, Result};
use clap::Parser;
use recipe_core::config::StoreConfig;
use recipe_core::{RecipeService, SqliteStore};
use recipe_server::config;
use recipe_server::server::Server;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database (overrides config file and RECIPE_DB)
    #[arg(long)]
    db: Option<PathBuf>,

    /// YAML store configuration
    #[arg(long, env = "RECIPE_CONFIG")]
    config: Option<PathBuf>,
}

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr) // stdout carries protocol traffic only
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::ServerConfig::from_env();
    init_logging(&cfg.log_level);

    let base = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let mut store_cfg = base.apply_env()?;
    if let Some(db) = args.db {
        store_cfg.db_path = db;
    }

    let store = SqliteStore::from_config(&store_cfg)
        .with_context(|| format!("failed to open store {}", store_cfg.db_path.display()))?;
    store.init_schema()?;

    tracing::info!(
        event = "server_start",
        db = %store_cfg.db_path.display(),
        config = ?cfg
    );

    Server::new(RecipeService::new(store), cfg).run().await
}
