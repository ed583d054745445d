use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use varnoise_core::AggregationEngine;
use varnoise_io::VcfWrite;

use crate::context;

pub fn run_export(matches: &ArgMatches) -> Result<()> {
    let output = matches
        .get_one::<String>("output")
        .context("--output has a default")?;

    let mut ctx = context::open(matches)?;
    let engine = AggregationEngine::new(ctx.store.as_mut());
    let records = engine.records().context("Failed to read aggregate records")?;

    let written = records
        .write_vcf(output)
        .with_context(|| format!("Failed to write {}", output))?;
    info!("Exported {} positions to {}", written, output);

    Ok(())
}
