//! Config resolution and store opening shared by every subcommand.

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::debug;

use varnoise_core::Store;
use varnoise_store::VarNoiseConfig;

use crate::consts::CONFIG_ARG;

pub struct RunContext {
    pub config: VarNoiseConfig,
    pub store: Box<dyn Store>,
}

impl RunContext {
    pub fn batch_size(&self) -> Result<NonZeroUsize> {
        Ok(self.config.batch_size()?)
    }
}

pub fn load_config(matches: &ArgMatches) -> Result<VarNoiseConfig> {
    let explicit = matches.get_one::<String>(CONFIG_ARG).map(Path::new);
    VarNoiseConfig::resolve(explicit).context("Failed to load configuration")
}

pub fn open(matches: &ArgMatches) -> Result<RunContext> {
    let config = load_config(matches)?;
    debug!("Opening {}", config.database);
    let store = config
        .database
        .open()
        .with_context(|| format!("Failed to open {}", config.database))?;
    Ok(RunContext { config, store })
}
