use std::num::NonZeroUsize;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;

use varnoise_core::{AggregationEngine, SampleRegistry};
use varnoise_io::GvcfSource;

use crate::context;

pub fn run_remove(matches: &ArgMatches) -> Result<()> {
    let sample = matches
        .get_one::<String>("SAMPLE")
        .context("SAMPLE is required")?;

    let mut ctx = context::open(matches)?;
    let batch_size = match matches.get_one::<NonZeroUsize>("batch-size") {
        Some(n) => *n,
        None => ctx.batch_size()?,
    };

    let gvcf = match matches.get_one::<String>("gvcf") {
        Some(path) => path.clone(),
        None => {
            ctx.store
                .lookup(sample)
                .context("Failed to read the sample registry")?
                .ok_or_else(|| anyhow!("Sample not registered: {}", sample))?
                .source_path
        }
    };

    let source = GvcfSource::open(&gvcf)
        .with_context(|| format!("Failed to open gVCF {}", gvcf))?
        .with_sample_name(sample);

    AggregationEngine::new(ctx.store.as_mut())
        .remove_sample(sample, source, batch_size)
        .with_context(|| format!("Failed to remove sample '{}'", sample))?;

    Ok(())
}
