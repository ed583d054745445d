use anyhow::{Context, Result};
use clap::ArgMatches;

use varnoise_core::AggregationEngine;

use crate::context;

pub fn run_samples(matches: &ArgMatches) -> Result<()> {
    let mut ctx = context::open(matches)?;
    let engine = AggregationEngine::new(ctx.store.as_mut());
    let samples = engine.samples().context("Failed to read the sample registry")?;

    for sample in &samples {
        println!(
            "{}\t{}\t{}",
            sample.name,
            sample.source_path,
            sample.loaded_at.to_rfc3339()
        );
    }
    println!("Number of samples: {}", samples.len());

    Ok(())
}
