use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{info, warn};

use varnoise_store::{DatabaseConfig, SqliteStore};

use crate::context::load_config;

pub fn run_init(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    match &config.database {
        DatabaseConfig::Sqlite { path } => {
            let store = SqliteStore::open(path)
                .with_context(|| format!("Failed to open {}", config.database))?;
            store
                .init_schema()
                .context("Failed to create database schema")?;
            info!("Initialized {}", config.database);
        }
        DatabaseConfig::Memory => {
            warn!("The in-memory database is not persisted; nothing to initialize");
        }
    }

    Ok(())
}
